//! 에이전트 이벤트 모델.
//!
//! `NotificationSink`를 통해 구독자에게 전달되는 태스크/서브태스크/액션/토큰/로그 이벤트.

use serde::{Deserialize, Serialize};

use crate::models::action::ActionSpec;
use crate::models::task::{SubtaskOutcome, TaskStatus};

/// 구독자에게 브로드캐스트되는 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AgentEvent {
    /// 태스크 상태/메시지 변경
    #[serde(rename_all = "camelCase")]
    TaskUpdated {
        task_id: String,
        status: TaskStatus,
        message: String,
    },
    /// 서브태스크 시작/종료
    #[serde(rename_all = "camelCase")]
    SubtaskUpdated {
        task_id: String,
        subtask_id: u32,
        description: String,
        active: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<SubtaskOutcome>,
    },
    /// 액션 실행됨
    #[serde(rename_all = "camelCase")]
    ActionExecuted {
        task_id: String,
        subtask_id: u32,
        index: usize,
        action: ActionSpec,
    },
    /// 누적 토큰 사용량
    TokenUsage { total: u64 },
    /// 진행 로그
    #[serde(rename_all = "camelCase")]
    Log {
        #[serde(skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        message: String,
    },
}

impl AgentEvent {
    /// 태스크 범위 로그 이벤트
    pub fn log(task_id: &str, message: impl Into<String>) -> Self {
        AgentEvent::Log {
            task_id: Some(task_id.to_string()),
            message: message.into(),
        }
    }

    /// 이벤트가 속한 태스크
    pub fn task_id(&self) -> Option<&str> {
        match self {
            AgentEvent::TaskUpdated { task_id, .. }
            | AgentEvent::SubtaskUpdated { task_id, .. }
            | AgentEvent::ActionExecuted { task_id, .. } => Some(task_id.as_str()),
            AgentEvent::Log { task_id, .. } => task_id.as_deref(),
            AgentEvent::TokenUsage { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = AgentEvent::TaskUpdated {
            task_id: "task-1".into(),
            status: TaskStatus::Running,
            message: "Task started".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "taskUpdated");
        assert_eq!(value["taskId"], "task-1");
        assert_eq!(value["status"], "running");
    }

    #[test]
    fn token_usage_has_no_task() {
        assert_eq!(AgentEvent::TokenUsage { total: 10 }.task_id(), None);
        assert_eq!(AgentEvent::log("task-2", "hi").task_id(), Some("task-2"));
    }
}
