//! 에러 타입 -- 도메인별 에러 정의

/// logbell 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogbellError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 모니터 루프 에러 (연결 실패, 시작 메시지 전송 실패 등)
    #[error("monitor error: {0}")]
    Monitor(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 필수 필드 누락
    #[error("missing required config field '{field}'")]
    MissingField { field: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
