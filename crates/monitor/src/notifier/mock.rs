//! 테스트용 Mock 알림 채널

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{Notifier, NotifierError};

/// 테스트용 Mock 알림 채널
///
/// 전송된 메시지를 기록하고, 실패를 시뮬레이션할 수 있습니다.
#[derive(Default)]
pub struct MockNotifier {
    /// 전송에 성공한 메시지 목록
    delivered: Mutex<Vec<String>>,
    /// deliver 호출 횟수 (성공/실패 포함)
    deliver_calls: AtomicUsize,
    /// deliver 실패 시뮬레이션
    fail_deliver: AtomicBool,
    /// probe 실패 시뮬레이션
    fail_probe: bool,
}

impl MockNotifier {
    /// 항상 성공하는 mock을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// probe가 실패하도록 설정합니다.
    pub fn with_failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    /// deliver 실패 여부를 전환합니다.
    pub fn set_fail_deliver(&self, fail: bool) {
        self.fail_deliver.store(fail, Ordering::SeqCst);
    }

    /// 전송에 성공한 메시지를 반환합니다.
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }

    /// deliver 호출 횟수를 반환합니다.
    pub fn deliver_calls(&self) -> usize {
        self.deliver_calls.load(Ordering::SeqCst)
    }
}

impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self) -> Result<String, NotifierError> {
        if self.fail_probe {
            return Err(NotifierError::Status {
                status: 401,
                body: "Unauthorized".to_owned(),
            });
        }
        Ok("mock_bot".to_owned())
    }

    async fn deliver(&self, message: &str) -> Result<(), NotifierError> {
        self.deliver_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deliver.load(Ordering::SeqCst) {
            return Err(NotifierError::Transport("mock failure".to_owned()));
        }
        self.delivered.lock().unwrap().push(message.to_owned());
        Ok(())
    }
}
