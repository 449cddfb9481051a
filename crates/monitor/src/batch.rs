//! 배치 버퍼 -- 매칭 엔트리 누적, 플러시 조건 판정, 메시지 렌더링
//!
//! [`BatchBuffer`]는 필터에 매칭된 라인을 도착 순서대로 보관하다가
//! 크기 임계값 또는 시간 임계값에 도달하면 하나의 메시지로 묶어 전송합니다.
//!
//! # 재시도 정책
//! 전송에 실패하면 엔트리를 비우지 않습니다. 다음 플러시에서 같은 내용을
//! 다시 전송하며, 실패한 배치가 조용히 사라지는 일은 없습니다.
//!
//! # 오버플로우 정책
//! 보관 한도(`max_pending`)를 넘는 경우:
//! - [`DropPolicy::Oldest`]: 가장 오래된 엔트리를 드롭
//! - [`DropPolicy::Newest`]: 새 유입을 거부

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

use logbell_core::config::DropPolicy;
use logbell_core::metrics as m;

use crate::notifier::Notifier;

/// 전송 메시지 최대 길이 (문자 수)
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// 최대 길이를 넘어 잘린 메시지 끝에 붙는 표시
pub const TRUNCATION_MARKER: &str = "\n\n... (truncated)";

/// 헤더 구분선 길이
const SEPARATOR_WIDTH: usize = 40;

/// 매칭된 라인 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEntry {
    /// 매칭된 필터 이름
    pub rule_name: String,
    /// 원본 라인
    pub raw_line: String,
}

impl FormattedEntry {
    /// 새 엔트리를 생성합니다.
    pub fn new(rule_name: impl Into<String>, raw_line: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            raw_line: raw_line.into(),
        }
    }
}

impl fmt::Display for FormattedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]\n{}", self.rule_name, self.raw_line)
    }
}

/// 미전송 매칭 엔트리 버퍼
pub struct BatchBuffer {
    /// 도착 순서로 정렬된 엔트리
    entries: VecDeque<FormattedEntry>,
    /// 마지막 성공 플러시 시각
    last_flush: Instant,
    /// 보관 한도
    max_pending: usize,
    /// 보관 한도 초과 시 드롭 정책
    drop_policy: DropPolicy,
    /// 지금까지 전송에 성공한 엔트리 수
    total_delivered: u64,
    /// 보관 한도 초과로 드롭된 엔트리 수
    dropped_count: u64,
}

impl BatchBuffer {
    /// 빈 버퍼를 생성합니다. 마지막 플러시 시각은 현재 시각으로 초기화됩니다.
    pub fn new(max_pending: usize, drop_policy: DropPolicy) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_pending.min(1024)),
            last_flush: Instant::now(),
            max_pending,
            drop_policy,
            total_delivered: 0,
            dropped_count: 0,
        }
    }

    /// 엔트리를 추가합니다.
    ///
    /// 보관 한도를 넘으면 드롭 정책에 따라 처리하고 `true`를 반환합니다.
    pub fn add(&mut self, entry: FormattedEntry) -> bool {
        let mut dropped = false;

        if self.entries.len() >= self.max_pending {
            self.dropped_count += 1;
            dropped = true;
            metrics::counter!(m::BATCH_ENTRIES_DROPPED_TOTAL).increment(1);

            match self.drop_policy {
                DropPolicy::Oldest => {
                    self.entries.pop_front();
                    tracing::warn!(
                        dropped = self.dropped_count,
                        max_pending = self.max_pending,
                        "pending batch full, dropped oldest entry"
                    );
                }
                DropPolicy::Newest => {
                    tracing::warn!(
                        dropped = self.dropped_count,
                        max_pending = self.max_pending,
                        rule = %entry.rule_name,
                        "pending batch full, rejected new entry"
                    );
                    return true;
                }
            }
        }

        self.entries.push_back(entry);
        metrics::gauge!(m::BATCH_PENDING_ENTRIES).set(self.entries.len() as f64);
        dropped
    }

    /// 플러시 조건을 확인합니다.
    ///
    /// 엔트리 수가 `batch_size` 이상이거나, 엔트리가 있고 마지막 플러시 이후
    /// `batch_timeout`이 지났으면 `true`를 반환합니다.
    pub fn should_flush(&self, now: Instant, batch_size: usize, batch_timeout: Duration) -> bool {
        if self.entries.len() >= batch_size {
            return true;
        }
        !self.entries.is_empty()
            && now.saturating_duration_since(self.last_flush) >= batch_timeout
    }

    /// 현재 엔트리를 현재 로컬 시각 기준으로 하나의 메시지로 렌더링합니다.
    pub fn render(&self) -> String {
        self.render_at(Local::now())
    }

    /// 주어진 시각을 헤더에 사용해 메시지를 렌더링합니다.
    ///
    /// 결과가 [`MAX_MESSAGE_CHARS`]를 넘으면 앞부분만 남기고
    /// [`TRUNCATION_MARKER`]를 붙입니다.
    pub fn render_at(&self, time: DateTime<Local>) -> String {
        let mut message = format!(
            "🔔 Log notification\nTime: {}\nEntries: {}\n{}\n\n",
            time.format("%Y-%m-%d %H:%M:%S"),
            self.entries.len(),
            "=".repeat(SEPARATOR_WIDTH),
        );

        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                message.push_str("\n\n");
            }
            message.push_str(&entry.to_string());
        }

        truncate_message(message)
    }

    /// 현재 엔트리 전체를 전송합니다.
    ///
    /// - 비어 있으면 전송 없이 `true`를 반환합니다.
    /// - 성공하면 엔트리를 비우고, 마지막 플러시 시각을 갱신하고,
    ///   누적 전송 수를 증가시킵니다.
    /// - 실패하면 엔트리를 그대로 유지하고 `false`를 반환합니다.
    pub async fn flush<N: Notifier>(&mut self, notifier: &N) -> bool {
        if self.entries.is_empty() {
            return true;
        }

        let count = self.entries.len();
        let message = self.render();

        match notifier.deliver(&message).await {
            Ok(()) => {
                self.entries.clear();
                self.last_flush = Instant::now();
                self.total_delivered += count as u64;

                metrics::counter!(m::DELIVERY_BATCHES_TOTAL).increment(1);
                metrics::counter!(m::DELIVERY_ENTRIES_TOTAL).increment(count as u64);
                metrics::gauge!(m::BATCH_PENDING_ENTRIES).set(0.0);

                tracing::info!(
                    notifier = notifier.name(),
                    entries = count,
                    total_delivered = self.total_delivered,
                    "batch delivered"
                );
                true
            }
            Err(e) => {
                metrics::counter!(m::DELIVERY_FAILURES_TOTAL).increment(1);
                tracing::warn!(
                    notifier = notifier.name(),
                    entries = count,
                    error = %e,
                    "batch delivery failed, keeping entries for retry"
                );
                false
            }
        }
    }

    /// 미전송 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 미전송 엔트리가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 미전송 엔트리를 도착 순서대로 순회합니다.
    pub fn entries(&self) -> impl Iterator<Item = &FormattedEntry> {
        self.entries.iter()
    }

    /// 지금까지 전송에 성공한 엔트리 수
    pub fn total_delivered(&self) -> u64 {
        self.total_delivered
    }

    /// 보관 한도 초과로 드롭된 엔트리 수
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// 마지막 성공 플러시 시각
    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }
}

/// 최대 길이를 넘는 메시지를 자르고 표시를 붙입니다.
fn truncate_message(mut message: String) -> String {
    if let Some((cut, _)) = message.char_indices().nth(MAX_MESSAGE_CHARS) {
        message.truncate(cut);
        message.push_str(TRUNCATION_MARKER);
    }
    message
}
