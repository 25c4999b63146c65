//! 태스크 모델.
//!
//! 태스크 상태 머신(`queued → running → completed | canceled | broken`)과
//! 서브태스크, 프롬프트 로그, 사용자 도움 메시지를 정의한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 태스크 상태. 종료 상태에서 다른 상태로 돌아갈 수 없다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// 대기열에서 대기 중
    Queued,
    /// 실행 중 (동시에 최대 1개)
    Running,
    /// 모든 서브태스크 처리 완료
    Completed,
    /// 사용자 취소
    Canceled,
    /// 복구 불가 실패 (캡처 실패, 통신 실패 등)
    Broken,
}

impl TaskStatus {
    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Canceled | TaskStatus::Broken
        )
    }

    /// 허용되는 전이인지 여부
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Queued => matches!(next, TaskStatus::Running | TaskStatus::Canceled),
            TaskStatus::Running => next.is_terminal(),
            TaskStatus::Completed | TaskStatus::Canceled | TaskStatus::Broken => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Canceled => "canceled",
            TaskStatus::Broken => "broken",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 태스크 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// 전역 고유 식별자
    pub id: String,
    /// 사용자 목표
    pub goal: String,
    pub status: TaskStatus,
    /// 사람이 읽는 상태 메시지
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// 대기 상태의 새 태스크
    pub fn new(goal: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("task-{}", Uuid::new_v4()),
            goal: goal.into(),
            status: TaskStatus::Queued,
            message: "Task queued".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 목표 분해 결과의 한 단계
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    #[serde(default)]
    pub id: u32,
    pub description: String,
}

impl SubTask {
    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

/// 서브태스크 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskOutcome {
    /// 검증 통과
    Achieved,
    /// 반복 상한 도달
    Exhausted,
}

/// 프롬프트 로그 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub iteration: u32,
    pub message: String,
}

/// 서브태스크 수명 동안 누적되는 프롬프트 로그. 서브태스크 완료 시 비운다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptLog {
    entries: Vec<PromptEntry>,
}

impl PromptLog {
    /// 첫 항목(반복 0)을 가진 로그
    pub fn starting_with(message: impl Into<String>) -> Self {
        let mut log = Self::default();
        log.push(0, message);
        log
    }

    pub fn push(&mut self, iteration: u32, message: impl Into<String>) {
        self.entries.push(PromptEntry {
            iteration,
            message: message.into(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 실행 중인 태스크에 사용자가 보낸 도움 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssistMessage {
    pub task_id: String,
    pub message: String,
    /// 프롬프트에 주입되었는지 여부 (최대 1회)
    pub injected: bool,
}

impl UserAssistMessage {
    pub fn new(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            message: message.into(),
            injected: false,
        }
    }

    /// 서브태스크 설명에 덧붙일 문구
    pub fn apply_to(&self, description: &str) -> String {
        format!(
            "{description}\n\nHELPER MESSAGE FROM THE USER: {}",
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_monotonic() {
        use TaskStatus::*;
        assert!(Queued.can_transition_to(Running));
        assert!(Queued.can_transition_to(Canceled));
        assert!(!Queued.can_transition_to(Completed));
        assert!(Running.can_transition_to(Broken));
        assert!(!Running.can_transition_to(Queued));
        for terminal in [Completed, Canceled, Broken] {
            assert!(terminal.is_terminal());
            for next in [Queued, Running, Completed, Canceled, Broken] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn task_ids_are_unique() {
        let a = Task::new("터미널 열기");
        let b = Task::new("터미널 열기");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("task-"));
        assert_eq!(a.status, TaskStatus::Queued);
    }

    #[test]
    fn prompt_log_append_and_clear() {
        let mut log = PromptLog::starting_with("목표");
        log.push(1, "메뉴를 여세요");
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].iteration, 1);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn assist_text_format() {
        let assist = UserAssistMessage::new("task-1", "use the dock");
        assert_eq!(
            assist.apply_to("open firefox"),
            "open firefox\n\nHELPER MESSAGE FROM THE USER: use the dock"
        );
    }
}
