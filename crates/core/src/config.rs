//! 설정 관리 -- config.yaml / config.toml 파싱 및 런타임 설정
//!
//! [`LogbellConfig`]는 logbell 전체 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, `logbell-daemon`에서 적용)
//! 2. 환경변수 (`LOGBELL_TELEGRAM_BOT_TOKEN=...` 형식)
//! 3. 설정 파일 (`config.yaml` 또는 `config.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logbell_core::error::LogbellError> {
//! use logbell_core::config::LogbellConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드 + 검증
//! let config = LogbellConfig::load("config.yaml").await?;
//!
//! // YAML 문자열에서 직접 파싱
//! let config = LogbellConfig::parse_yaml("log_file: /var/log/app.log")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogbellError};

/// logbell 통합 설정
///
/// 설정 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogbellConfig {
    /// 일반 설정 (로깅)
    pub general: GeneralConfig,
    /// Telegram 알림 채널 설정
    pub telegram: TelegramConfig,
    /// 감시할 로그 파일 경로
    pub log_file: String,
    /// 매칭 필터 목록 (설정 순서가 곧 매칭 우선순위)
    pub filters: Vec<FilterConfig>,
    /// 폴링/배치 설정
    pub monitoring: MonitoringConfig,
    /// Prometheus 메트릭 설정
    pub metrics: MetricsConfig,
}

/// 설정 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (기본값)
    Yaml,
    /// TOML
    Toml,
}

impl ConfigFormat {
    /// 파일 확장자로 형식을 결정합니다. `.toml` 이외는 모두 YAML로 취급합니다.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

impl LogbellConfig {
    /// 설정 파일을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. 파일 파싱 (확장자로 YAML/TOML 결정)
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogbellError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일을 파싱합니다 (환경변수 오버라이드와 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogbellError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogbellError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogbellError::Io(e)
            }
        })?;

        match ConfigFormat::from_path(path) {
            ConfigFormat::Yaml => Self::parse_yaml(&content),
            ConfigFormat::Toml => Self::parse_toml(&content),
        }
    }

    /// YAML 문자열에서 설정을 파싱합니다.
    ///
    /// 빈 문서는 기본값 설정으로 취급합니다.
    pub fn parse_yaml(yaml_str: &str) -> Result<Self, LogbellError> {
        if yaml_str.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml_str).map_err(|e| {
            LogbellError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse_toml(toml_str: &str) -> Result<Self, LogbellError> {
        toml::from_str(toml_str).map_err(|e| {
            LogbellError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGBELL_{SECTION}_{FIELD}`
    /// 예: `LOGBELL_TELEGRAM_BOT_TOKEN=123:abc`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGBELL_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGBELL_GENERAL_LOG_FORMAT");

        // Telegram
        override_string(&mut self.telegram.bot_token, "LOGBELL_TELEGRAM_BOT_TOKEN");
        override_string(&mut self.telegram.chat_id, "LOGBELL_TELEGRAM_CHAT_ID");
        override_string(&mut self.telegram.api_base, "LOGBELL_TELEGRAM_API_BASE");
        override_u64(
            &mut self.telegram.send_timeout_secs,
            "LOGBELL_TELEGRAM_SEND_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.telegram.probe_timeout_secs,
            "LOGBELL_TELEGRAM_PROBE_TIMEOUT_SECS",
        );

        // Log file
        override_string(&mut self.log_file, "LOGBELL_LOG_FILE");

        // Monitoring
        override_parsed(
            &mut self.monitoring.check_interval,
            "LOGBELL_MONITORING_CHECK_INTERVAL",
        );
        override_usize(
            &mut self.monitoring.batch_size,
            "LOGBELL_MONITORING_BATCH_SIZE",
        );
        override_parsed(
            &mut self.monitoring.batch_timeout,
            "LOGBELL_MONITORING_BATCH_TIMEOUT",
        );
        override_usize(
            &mut self.monitoring.max_pending,
            "LOGBELL_MONITORING_MAX_PENDING",
        );
        override_parsed(
            &mut self.monitoring.drop_policy,
            "LOGBELL_MONITORING_DROP_POLICY",
        );
        override_parsed(
            &mut self.monitoring.trailing_line,
            "LOGBELL_MONITORING_TRAILING_LINE",
        );
        override_parsed(
            &mut self.monitoring.start_position,
            "LOGBELL_MONITORING_START_POSITION",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "LOGBELL_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "LOGBELL_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "LOGBELL_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "LOGBELL_METRICS_ENDPOINT");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 필터 패턴의 정규식 문법은 여기서 검사하지 않습니다.
    /// 잘못된 패턴은 패턴 컴파일 단계에서 해당 필터만 제외됩니다.
    pub fn validate(&self) -> Result<(), LogbellError> {
        // 필수 필드
        require_non_empty(&self.telegram.bot_token, "telegram.bot_token")?;
        require_non_empty(&self.telegram.chat_id, "telegram.chat_id")?;
        require_non_empty(&self.log_file, "log_file")?;

        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        require_positive(self.telegram.send_timeout_secs, "telegram.send_timeout_secs")?;
        require_positive(
            self.telegram.probe_timeout_secs,
            "telegram.probe_timeout_secs",
        )?;

        for (idx, filter) in self.filters.iter().enumerate() {
            if filter.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("filters[{idx}].name"),
                    reason: "filter name must not be empty".to_owned(),
                }
                .into());
            }
        }

        let monitoring = &self.monitoring;
        require_positive_secs(monitoring.check_interval, "monitoring.check_interval")?;
        require_positive_secs(monitoring.batch_timeout, "monitoring.batch_timeout")?;
        if monitoring.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitoring.batch_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }
        if monitoring.max_pending < monitoring.batch_size {
            return Err(ConfigError::InvalidValue {
                field: "monitoring.max_pending".to_owned(),
                reason: format!(
                    "must be at least batch_size ({})",
                    monitoring.batch_size
                ),
            }
            .into());
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metrics.port".to_owned(),
                reason: "must be greater than 0 when metrics are enabled".to_owned(),
            }
            .into());
        }

        Ok(())
    }

    /// 활성화된 필터 수를 반환합니다 (패턴 컴파일 전 기준).
    pub fn enabled_filter_count(&self) -> usize {
        self.filters.iter().filter(|f| f.enabled).count()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// Telegram Bot API 설정
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API 토큰
    pub bot_token: String,
    /// 대상 채팅 ID (정수 또는 문자열 모두 허용)
    #[serde(deserialize_with = "deserialize_chat_id")]
    pub chat_id: String,
    /// Bot API 기본 URL
    pub api_base: String,
    /// 메시지 전송 타임아웃 (초)
    pub send_timeout_secs: u64,
    /// 연결 확인(getMe) 타임아웃 (초)
    pub probe_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: "https://api.telegram.org".to_owned(),
            send_timeout_secs: 10,
            probe_timeout_secs: 5,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.bot_token.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("TelegramConfig")
            .field("bot_token", &token)
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .finish()
    }
}

/// 채팅 ID를 정수/문자열 어느 쪽으로 적어도 문자열로 받습니다.
fn deserialize_chat_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChatId {
        Int(i64),
        Text(String),
    }

    Ok(match ChatId::deserialize(deserializer)? {
        ChatId::Int(id) => id.to_string(),
        ChatId::Text(text) => text,
    })
}

/// 필터(매칭 규칙) 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 필터 이름 (알림 메시지의 `[name]` 헤더)
    pub name: String,
    /// 정규식 패턴 (라인 내 어디서든 매칭되면 성공)
    pub pattern: String,
    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// 버퍼 오버플로우 시 드롭 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// 가장 오래된 엔트리를 드롭 (기본값)
    #[default]
    Oldest,
    /// 새 유입을 거부
    Newest,
}

/// 줄바꿈으로 끝나지 않은 마지막 조각의 처리 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingLine {
    /// 줄바꿈이 도착할 때까지 보류 (기본값)
    #[default]
    Hold,
    /// 읽은 즉시 방출하고 오프셋을 EOF로 전진
    Emit,
}

impl FromStr for DropPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oldest" => Ok(Self::Oldest),
            "newest" => Ok(Self::Newest),
            other => Err(format!("unknown drop policy '{other}'")),
        }
    }
}

impl FromStr for TrailingLine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hold" => Ok(Self::Hold),
            "emit" => Ok(Self::Emit),
            other => Err(format!("unknown trailing line mode '{other}'")),
        }
    }
}

/// 실행 시작 시 오프셋 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    /// 파일 처음부터 (기본값)
    #[default]
    Beginning,
    /// 현재 파일 끝부터 (기존 내용 건너뜀)
    End,
}

impl FromStr for StartPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginning" => Ok(Self::Beginning),
            "end" => Ok(Self::End),
            other => Err(format!("unknown start position '{other}'")),
        }
    }
}

/// 폴링/배치 설정
///
/// 시간 값은 초 단위이며 소수(`0.5`)도 허용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// 폴링 주기 (초)
    pub check_interval: f64,
    /// 배치 크기 임계값 (이 개수만큼 모이면 플러시)
    pub batch_size: usize,
    /// 배치 시간 임계값 (초)
    pub batch_timeout: f64,
    /// 미전송 엔트리 최대 보관 수
    pub max_pending: usize,
    /// 보관 한도 초과 시 드롭 정책
    pub drop_policy: DropPolicy,
    /// 미완성 마지막 라인 처리 방식
    pub trailing_line: TrailingLine,
    /// 시작 오프셋 위치
    pub start_position: StartPosition,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval: 1.0,
            batch_size: 10,
            batch_timeout: 5.0,
            max_pending: 1000,
            drop_policy: DropPolicy::Oldest,
            trailing_line: TrailingLine::Hold,
            start_position: StartPosition::Beginning,
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 검증 헬퍼 ---

fn require_non_empty(value: &str, field: &str) -> Result<(), LogbellError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField {
            field: field.to_owned(),
        }
        .into());
    }
    Ok(())
}

fn require_positive(value: u64, field: &str) -> Result<(), LogbellError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "must be greater than 0".to_owned(),
        }
        .into());
    }
    Ok(())
}

/// 초 단위 값을 [`Duration`]으로 변환합니다.
///
/// 0 이하, NaN, 무한대, `Duration`으로 표현할 수 없는 값은 `None`입니다.
/// 설정 검증과 런타임 설정 검증이 같은 기준을 쓰도록 공유합니다.
pub fn positive_secs(value: f64) -> Option<Duration> {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

fn require_positive_secs(value: f64, field: &str) -> Result<(), LogbellError> {
    if positive_secs(value).is_none() {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "must be a positive number of seconds".to_owned(),
        }
        .into());
    }
    Ok(())
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_parsed<T>(target: &mut T, env_key: &str)
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(e) => warn!(
                env_key,
                value = val.as_str(),
                error = %e,
                "failed to parse env var, ignoring"
            ),
        }
    }
}
