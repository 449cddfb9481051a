#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`pattern`]: 필터 정규식 컴파일 및 첫 매칭 규칙 탐색
//! - [`tailer`]: 바이트 오프셋 기반 로그 파일 테일링 (truncation 감지 포함)
//! - [`batch`]: 매칭 엔트리 누적, 플러시 조건 판정, 메시지 렌더링, 재시도
//! - [`notifier`]: 알림 채널 trait 및 Telegram Bot API 구현
//! - [`monitor`]: 모니터 루프 생명주기 (Starting -> Connected -> Running -> Stopping -> Stopped)
//! - [`config`]: 모니터 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Tailer -> PatternSet -> BatchBuffer -> Notifier -> Telegram
//!   |           |              |
//! offset    first match   size/time trigger, retry on failure
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod monitor;
pub mod notifier;
pub mod pattern;
pub mod tailer;

// --- 주요 타입 re-export ---

// 모니터 루프
pub use monitor::{
    FlushOutcome, MonitorLoop, MonitorLoopBuilder, MonitorState, RunSummary, TickReport,
};

// 설정
pub use config::{MonitorConfig, MonitorConfigBuilder};

// 에러
pub use error::MonitorError;

// 알림 채널
pub use notifier::{Notifier, NotifierError, TelegramNotifier};

// 구성 요소
pub use batch::{BatchBuffer, FormattedEntry};
pub use pattern::{PatternRule, PatternSet, SkippedRule};
pub use tailer::Tailer;
