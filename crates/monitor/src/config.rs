//! 모니터 설정
//!
//! [`MonitorConfig`]는 core의 [`LogbellConfig`](logbell_core::config::LogbellConfig)에서
//! 모니터 루프가 사용하는 부분만 추려 런타임 타입(`PathBuf`, `Duration`)으로 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logbell_core::config::LogbellConfig;
//! use logbell_monitor::config::MonitorConfig;
//!
//! let core_config = LogbellConfig::load("config.yaml").await?;
//! let config = MonitorConfig::from_core(&core_config);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use logbell_core::config::{
    DropPolicy, FilterConfig, LogbellConfig, StartPosition, TrailingLine, positive_secs,
};

use crate::error::MonitorError;

/// 모니터 루프 설정
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// 감시할 로그 파일 경로
    pub log_file: PathBuf,
    /// 필터 목록 (설정 순서 유지)
    pub filters: Vec<FilterConfig>,
    /// 폴링 주기 (초, 소수 허용)
    pub check_interval_secs: f64,
    /// 배치 크기 임계값
    pub batch_size: usize,
    /// 배치 시간 임계값 (초, 소수 허용)
    pub batch_timeout_secs: f64,
    /// 미전송 엔트리 최대 보관 수
    pub max_pending: usize,
    /// 보관 한도 초과 시 드롭 정책
    pub drop_policy: DropPolicy,
    /// 미완성 마지막 라인 처리 방식
    pub trailing_line: TrailingLine,
    /// 시작 오프셋 위치
    pub start_position: StartPosition,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/var/log/syslog"),
            filters: Vec::new(),
            check_interval_secs: 1.0,
            batch_size: 10,
            batch_timeout_secs: 5.0,
            max_pending: 1000,
            drop_policy: DropPolicy::Oldest,
            trailing_line: TrailingLine::Hold,
            start_position: StartPosition::Beginning,
        }
    }
}

impl MonitorConfig {
    /// core의 `LogbellConfig`에서 모니터 설정을 생성합니다.
    pub fn from_core(core: &LogbellConfig) -> Self {
        let monitoring = &core.monitoring;
        Self {
            log_file: PathBuf::from(&core.log_file),
            filters: core.filters.clone(),
            check_interval_secs: monitoring.check_interval,
            batch_size: monitoring.batch_size,
            batch_timeout_secs: monitoring.batch_timeout,
            max_pending: monitoring.max_pending,
            drop_policy: monitoring.drop_policy,
            trailing_line: monitoring.trailing_line,
            start_position: monitoring.start_position,
        }
    }

    /// 폴링 주기
    ///
    /// 검증되지 않은 값이면 1초를 사용합니다.
    pub fn check_interval(&self) -> Duration {
        positive_secs(self.check_interval_secs).unwrap_or(Duration::from_secs(1))
    }

    /// 배치 시간 임계값
    ///
    /// 검증되지 않은 값이면 5초를 사용합니다.
    pub fn batch_timeout(&self) -> Duration {
        positive_secs(self.batch_timeout_secs).unwrap_or(Duration::from_secs(5))
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 시간 값은 core 설정 검증과 같은 [`positive_secs`] 기준을 사용합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.log_file.as_os_str().is_empty() {
            return Err(MonitorError::Config {
                field: "log_file".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if positive_secs(self.check_interval_secs).is_none() {
            return Err(MonitorError::Config {
                field: "check_interval".to_owned(),
                reason: "must be a positive number of seconds".to_owned(),
            });
        }

        if self.batch_size == 0 {
            return Err(MonitorError::Config {
                field: "batch_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if positive_secs(self.batch_timeout_secs).is_none() {
            return Err(MonitorError::Config {
                field: "batch_timeout".to_owned(),
                reason: "must be a positive number of seconds".to_owned(),
            });
        }

        if self.max_pending < self.batch_size {
            return Err(MonitorError::Config {
                field: "max_pending".to_owned(),
                reason: format!("must be at least batch_size ({})", self.batch_size),
            });
        }

        Ok(())
    }
}

/// 모니터 설정 빌더
///
/// 3개 이상의 설정 필드가 있으므로 빌더 패턴을 사용합니다.
#[derive(Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시할 로그 파일을 설정합니다.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = path.into();
        self
    }

    /// 필터를 하나 추가합니다 (활성 상태).
    pub fn filter(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.config.filters.push(FilterConfig {
            name: name.into(),
            pattern: pattern.into(),
            enabled: true,
        });
        self
    }

    /// 필터 목록 전체를 설정합니다.
    pub fn filters(mut self, filters: Vec<FilterConfig>) -> Self {
        self.config.filters = filters;
        self
    }

    /// 폴링 주기(초)를 설정합니다.
    pub fn check_interval_secs(mut self, secs: f64) -> Self {
        self.config.check_interval_secs = secs;
        self
    }

    /// 배치 크기 임계값을 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 배치 시간 임계값(초)을 설정합니다.
    pub fn batch_timeout_secs(mut self, secs: f64) -> Self {
        self.config.batch_timeout_secs = secs;
        self
    }

    /// 미전송 엔트리 최대 보관 수를 설정합니다.
    pub fn max_pending(mut self, max: usize) -> Self {
        self.config.max_pending = max;
        self
    }

    /// 드롭 정책을 설정합니다.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.config.drop_policy = policy;
        self
    }

    /// 미완성 마지막 라인 처리 방식을 설정합니다.
    pub fn trailing_line(mut self, trailing: TrailingLine) -> Self {
        self.config.trailing_line = trailing;
        self
    }

    /// 시작 오프셋 위치를 설정합니다.
    pub fn start_position(mut self, position: StartPosition) -> Self {
        self.config.start_position = position;
        self
    }

    /// 설정을 검증하고 `MonitorConfig`를 생성합니다.
    pub fn build(self) -> Result<MonitorConfig, MonitorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
