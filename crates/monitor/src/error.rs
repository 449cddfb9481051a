//! 모니터 에러 타입
//!
//! [`MonitorError`]는 시작 단계에서 치명적으로 취급되는 에러만 표현합니다.
//! 실행 중 발생하는 파일 I/O 실패나 전송 실패는 에러로 전파되지 않고
//! 로그를 남긴 뒤 다음 틱에서 재시도됩니다.
//!
//! `From<MonitorError> for LogbellError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logbell_core::error::LogbellError;

use crate::notifier::NotifierError;

/// 모니터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 알림 채널 연결 확인(probe) 실패
    #[error("notifier connectivity check failed: {0}")]
    Connectivity(#[source] NotifierError),

    /// 시작 안내 메시지 전송 실패
    #[error("failed to deliver startup message: {0}")]
    StartupMessage(#[source] NotifierError),

    /// 현재 상태에서 허용되지 않는 전환
    #[error("invalid state transition: {from} -> {to}")]
    InvalidState {
        /// 현재 상태
        from: &'static str,
        /// 요청된 상태
        to: &'static str,
    },
}

impl From<MonitorError> for LogbellError {
    fn from(err: MonitorError) -> Self {
        LogbellError::Monitor(err.to_string())
    }
}
