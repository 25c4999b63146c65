//! 사용자 도움 메시지 우편함.
//!
//! 태스크당 미주입 메시지는 최대 1개다. 새 메시지는 이전 미주입 메시지를 대체하고,
//! 워커가 꺼내 가면(주입) 사라진다.

use std::collections::HashMap;

use deskpilot_core::models::task::UserAssistMessage;
use parking_lot::Mutex;

/// 태스크별 대기 중인 도움 메시지
#[derive(Debug, Default)]
pub struct AssistMailbox {
    pending: Mutex<HashMap<String, UserAssistMessage>>,
}

impl AssistMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// 메시지 등록. 대체된 이전 메시지가 있으면 반환한다.
    pub fn post(&self, task_id: &str, message: impl Into<String>) -> Option<UserAssistMessage> {
        self.pending
            .lock()
            .insert(task_id.to_string(), UserAssistMessage::new(task_id, message))
    }

    /// 주입할 메시지를 꺼낸다 (한 번만 반환됨)
    pub fn take(&self, task_id: &str) -> Option<UserAssistMessage> {
        self.pending.lock().remove(task_id).map(|mut message| {
            message.injected = true;
            message
        })
    }

    /// 태스크 종료 시 남은 메시지 폐기
    pub fn discard(&self, task_id: &str) -> bool {
        self.pending.lock().remove(task_id).is_some()
    }

    pub fn has_pending(&self, task_id: &str) -> bool {
        self.pending.lock().contains_key(task_id)
    }
}
