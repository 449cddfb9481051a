//! 모니터 루프 -- 테일링/매칭/배치/전송 전체 흐름과 생명주기 관리
//!
//! [`MonitorLoop`]는 테일러 상태와 미전송 배치를 단독으로 소유하며,
//! 하나의 협력적 루프에서 틱마다 순서대로 처리합니다.
//!
//! # 상태 전이
//! ```text
//! Starting ──connect()──> Connected ──run()──> Running
//!     │                                           │ cancel
//!     │ probe/시작 메시지 실패                    ▼
//!     └────────────────> Stopped <──────────── Stopping
//! ```
//!
//! # 틱 처리 순서
//! ```text
//! Tailer.read_new_lines()
//!     │
//! PatternSet.first_match() ── 매칭 ──> BatchBuffer.add()
//!     │
//! BatchBuffer.should_flush() ── true ──> BatchBuffer.flush(notifier)
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use logbell_core::config::StartPosition;
use logbell_core::metrics as m;

use crate::batch::{BatchBuffer, FormattedEntry};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::notifier::Notifier;
use crate::pattern::PatternSet;
use crate::tailer::Tailer;

/// 모니터 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// 생성됨, 아직 알림 채널에 연결하지 않음
    Starting,
    /// 연결 확인 및 시작 메시지 전송 완료
    Connected,
    /// 폴링 루프 실행 중
    Running,
    /// 종료 처리 중 (마지막 플러시, 종료 요약 전송)
    Stopping,
    /// 종료됨 (최종 상태)
    Stopped,
}

impl MonitorState {
    /// 상태명을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Connected => "connected",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 틱의 플러시 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 플러시 조건 미충족
    Skipped,
    /// 전송 성공 (전송된 엔트리 수)
    Delivered(usize),
    /// 전송 실패, 엔트리는 재시도를 위해 유지됨
    Failed,
}

/// 한 틱의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// 새로 읽은 라인 수
    pub lines_read: usize,
    /// 필터에 매칭된 라인 수
    pub matched: usize,
    /// 플러시 결과
    pub flush: FlushOutcome,
}

/// 종료 시점 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 전송에 성공한 엔트리 누적 수
    pub total_delivered: u64,
    /// 최종 플러시 이후에도 남은 미전송 엔트리 수
    pub undelivered: usize,
}

/// 로그 모니터 루프
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use logbell_monitor::{MonitorLoopBuilder, TelegramNotifier};
///
/// let notifier = Arc::new(TelegramNotifier::new(&core_config.telegram)?);
/// let mut monitor = MonitorLoopBuilder::new()
///     .config(MonitorConfig::from_core(&core_config))
///     .notifier(notifier)
///     .build()?;
///
/// let summary = monitor.run(cancel_token).await?;
/// ```
pub struct MonitorLoop<N: Notifier> {
    /// 모니터 설정
    config: MonitorConfig,
    /// 알림 채널
    notifier: Arc<N>,
    /// 컴파일된 필터
    patterns: PatternSet,
    /// 로그 파일 테일러
    tailer: Tailer,
    /// 미전송 배치
    batch: BatchBuffer,
    /// 현재 상태
    state: MonitorState,
}

impl<N: Notifier> MonitorLoop<N> {
    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// 전송에 성공한 엔트리 누적 수를 반환합니다.
    pub fn total_delivered(&self) -> u64 {
        self.batch.total_delivered()
    }

    /// 미전송 엔트리 수를 반환합니다.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// 컴파일된 필터를 반환합니다.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// 테일러를 반환합니다.
    pub fn tailer(&self) -> &Tailer {
        &self.tailer
    }

    /// 모니터 설정을 반환합니다.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// 알림 채널 연결을 확인하고 시작 메시지를 전송합니다.
    ///
    /// `Starting` 상태에서만 호출할 수 있습니다.
    /// probe 또는 시작 메시지 전송이 실패하면 재시도 없이 `Stopped`로 전이합니다.
    pub async fn connect(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Starting {
            return Err(MonitorError::InvalidState {
                from: self.state.as_str(),
                to: MonitorState::Connected.as_str(),
            });
        }

        match self.notifier.probe().await {
            Ok(identity) => {
                tracing::info!(
                    notifier = self.notifier.name(),
                    identity = %identity,
                    "notifier reachable"
                );
            }
            Err(e) => {
                tracing::error!(
                    notifier = self.notifier.name(),
                    error = %e,
                    "notifier connectivity check failed"
                );
                self.state = MonitorState::Stopped;
                return Err(MonitorError::Connectivity(e));
            }
        }

        let message = self.startup_message();
        if let Err(e) = self.notifier.deliver(&message).await {
            tracing::error!(
                notifier = self.notifier.name(),
                error = %e,
                "failed to deliver startup message"
            );
            self.state = MonitorState::Stopped;
            return Err(MonitorError::StartupMessage(e));
        }

        if self.config.start_position == StartPosition::End {
            self.tailer.seek_to_end().await;
        }

        self.state = MonitorState::Connected;
        tracing::info!(
            path = %self.tailer.path().display(),
            filters = self.patterns.len(),
            offset = self.tailer.offset(),
            "monitor connected"
        );
        Ok(())
    }

    /// 한 틱을 처리합니다: 새 라인 읽기, 매칭, 배치 추가, 조건부 플러시.
    ///
    /// 실패하지 않습니다. 읽기 실패는 "새 라인 없음", 전송 실패는
    /// [`FlushOutcome::Failed`]로 보고되며 다음 틱에서 재시도됩니다.
    pub async fn poll_once(&mut self) -> TickReport {
        let lines = self.tailer.read_new_lines().await;
        let lines_read = lines.len();
        let mut matched = 0;

        for line in lines {
            if let Some(rule) = self.patterns.first_match(&line) {
                tracing::debug!(rule = rule, line = %line, "line matched");
                metrics::counter!(m::LINES_MATCHED_TOTAL, m::LABEL_RULE => rule.to_owned())
                    .increment(1);
                self.batch.add(FormattedEntry::new(rule, line));
                matched += 1;
            }
        }

        let flush = if self.batch.should_flush(
            Instant::now(),
            self.config.batch_size,
            self.config.batch_timeout(),
        ) {
            let count = self.batch.len();
            if self.batch.flush(self.notifier.as_ref()).await {
                FlushOutcome::Delivered(count)
            } else {
                FlushOutcome::Failed
            }
        } else {
            FlushOutcome::Skipped
        };

        TickReport {
            lines_read,
            matched,
            flush,
        }
    }

    /// 취소될 때까지 폴링 루프를 실행한 뒤 종료 처리를 수행합니다.
    ///
    /// `Starting` 상태라면 먼저 [`connect`](Self::connect)를 수행합니다.
    /// 취소는 틱 경계에서만 관찰되며, 진행 중인 전송은 알림 채널의
    /// 요청 타임아웃으로 제한됩니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<RunSummary, MonitorError> {
        if self.state == MonitorState::Starting {
            self.connect().await?;
        }

        if self.state != MonitorState::Connected {
            return Err(MonitorError::InvalidState {
                from: self.state.as_str(),
                to: MonitorState::Running.as_str(),
            });
        }

        self.state = MonitorState::Running;
        tracing::info!(
            check_interval_secs = self.config.check_interval_secs,
            batch_size = self.config.batch_size,
            batch_timeout_secs = self.config.batch_timeout_secs,
            "monitor loop running"
        );

        let mut interval = tokio::time::interval(self.config.check_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!("cancellation requested, stopping monitor");
                    break;
                }
                _ = interval.tick() => {}
            }

            self.poll_once().await;
        }

        Ok(self.shutdown().await)
    }

    /// 종료 처리를 수행합니다.
    ///
    /// 남은 엔트리를 한 번 플러시하고 종료 요약 메시지를 전송합니다.
    /// 둘 다 최선 노력(best-effort)이며 실패해도 `Stopped`에 도달합니다.
    /// 연결 전(`Starting`)이거나 이미 종료된 경우 메시지를 보내지 않습니다.
    pub async fn shutdown(&mut self) -> RunSummary {
        match self.state {
            MonitorState::Stopped => return self.summary(),
            MonitorState::Starting => {
                self.state = MonitorState::Stopped;
                return self.summary();
            }
            _ => {}
        }

        self.state = MonitorState::Stopping;

        if !self.batch.is_empty() && !self.batch.flush(self.notifier.as_ref()).await {
            tracing::warn!(
                undelivered = self.batch.len(),
                "final flush failed, pending entries are lost"
            );
        }

        let message = format!(
            "🛑 Log monitor stopped\n\nLines delivered: {}",
            self.batch.total_delivered()
        );
        if let Err(e) = self.notifier.deliver(&message).await {
            tracing::warn!(
                notifier = self.notifier.name(),
                error = %e,
                "failed to deliver shutdown summary"
            );
        }

        self.state = MonitorState::Stopped;
        let summary = self.summary();
        tracing::info!(
            total_delivered = summary.total_delivered,
            undelivered = summary.undelivered,
            "monitor stopped"
        );
        summary
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            total_delivered: self.batch.total_delivered(),
            undelivered: self.batch.len(),
        }
    }

    fn startup_message(&self) -> String {
        format!(
            "🤖 Log monitor started\n\nFile: {}\nFilters: {}\nStatus: monitoring active",
            self.tailer.path().display(),
            self.patterns.len()
        )
    }
}

/// 모니터 루프 빌더
pub struct MonitorLoopBuilder<N: Notifier> {
    config: MonitorConfig,
    notifier: Option<Arc<N>>,
}

impl<N: Notifier> MonitorLoopBuilder<N> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            notifier: None,
        }
    }

    /// 모니터 설정을 지정합니다.
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// 알림 채널을 설정합니다.
    pub fn notifier(mut self, notifier: Arc<N>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 모니터 루프를 빌드합니다.
    ///
    /// 설정을 검증하고 필터를 컴파일합니다. 잘못된 필터 패턴은 제외될 뿐
    /// 빌드를 실패시키지 않습니다.
    pub fn build(self) -> Result<MonitorLoop<N>, MonitorError> {
        self.config.validate()?;

        let notifier = self.notifier.ok_or_else(|| MonitorError::Config {
            field: "notifier".to_owned(),
            reason: "notifier must be provided".to_owned(),
        })?;

        let patterns = PatternSet::compile(&self.config.filters);
        if patterns.is_empty() {
            tracing::warn!("no active filters, no lines will be delivered");
        }

        let tailer = Tailer::new(&self.config.log_file, self.config.trailing_line);
        let batch = BatchBuffer::new(self.config.max_pending, self.config.drop_policy);

        Ok(MonitorLoop {
            config: self.config,
            notifier,
            patterns,
            tailer,
            batch,
            state: MonitorState::Starting,
        })
    }
}

impl<N: Notifier> Default for MonitorLoopBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}
