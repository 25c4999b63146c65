//! 액션 배치 실행기.
//!
//! 판단 서비스가 반환한 배치를 `sequence_id` 오름차순으로 실행한다.
//! 액션 사이마다 고정 지연을 두며, 모든 대기와 입력 호출은 취소 토큰과 경합한다.
//!
//! - `stopIteration`: 남은 배치 중단 (검증 단계는 호출자가 계속 진행)
//! - `stateUpdate`: 화면 안정화 대기 후 배치 중단
//! - `repeat`: 이 배치에서 이미 실행된 시퀀스 범위를 재실행
//! - 알 수 없는 액션과 입력 실패: 경고 후 다음 액션으로

use std::sync::Arc;
use std::time::Duration;

use deskpilot_core::cancel::CancellationToken;
use deskpilot_core::error::CoreError;
use deskpilot_core::models::action::{ActionKind, ActionSpec};
use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::ports::input_driver::{InputDriver, MouseButton};
use deskpilot_core::ports::notifier::NotificationSink;
use tracing::{debug, info, warn};

use crate::keys::split_combo;

/// repeat 한 번에 허용하는 최대 반복 횟수
pub const MAX_REPEAT_TIMES: u32 = 100;

/// 배치가 끝까지 가지 않고 멈춘 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    StopIteration,
    StateUpdate,
}

/// 배치 실행 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// 실행 순서대로의 액션 (중단 액션 포함, repeat 재실행분은 repeat 한 항목)
    pub executed: Vec<ActionSpec>,
    pub halted_by: Option<HaltReason>,
}

/// 이벤트 귀속 정보
#[derive(Debug, Clone, Copy)]
pub struct BatchScope<'a> {
    pub task_id: &'a str,
    pub subtask_id: u32,
}

/// 액션 배치 실행기
pub struct ActionExecutor {
    driver: Arc<dyn InputDriver>,
    notifier: Arc<dyn NotificationSink>,
    action_delay: Duration,
    settle_delay: Duration,
}

impl ActionExecutor {
    pub fn new(
        driver: Arc<dyn InputDriver>,
        notifier: Arc<dyn NotificationSink>,
        action_delay: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            driver,
            notifier,
            action_delay,
            settle_delay,
        }
    }

    pub fn driver(&self) -> &Arc<dyn InputDriver> {
        &self.driver
    }

    /// 배치 실행. 취소 시에만 `Err(CoreError::Canceled)`.
    pub async fn execute_batch(
        &self,
        mut batch: Vec<ActionSpec>,
        scope: BatchScope<'_>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, CoreError> {
        batch.sort_by_key(|action| action.sequence_id);
        let mut report = BatchReport::default();

        for (index, action) in batch.into_iter().enumerate() {
            cancel.sleep(self.action_delay).await?;
            debug!(
                task_id = scope.task_id,
                seq = action.sequence_id,
                action = action.kind.tag(),
                "액션 실행"
            );

            let halt = match &action.kind {
                ActionKind::StopIteration => {
                    info!(task_id = scope.task_id, "stopIteration: 남은 배치 중단");
                    Some(HaltReason::StopIteration)
                }
                ActionKind::StateUpdate => {
                    cancel.sleep(self.settle_delay).await?;
                    info!(task_id = scope.task_id, "stateUpdate: 화면 재확인을 위해 배치 중단");
                    Some(HaltReason::StateUpdate)
                }
                ActionKind::Repeat { first, last, times } => {
                    let replay = replay_range(&report.executed, action.sequence_id, *first, *last);
                    self.repeat(&replay, *times, cancel).await?;
                    None
                }
                kind => {
                    self.perform(kind, cancel).await?;
                    None
                }
            };

            self.notifier.publish(AgentEvent::ActionExecuted {
                task_id: scope.task_id.to_string(),
                subtask_id: scope.subtask_id,
                index,
                action: action.clone(),
            });
            report.executed.push(action);

            if halt.is_some() {
                report.halted_by = halt;
                break;
            }
        }

        Ok(report)
    }

    async fn repeat(
        &self,
        replay: &[ActionKind],
        times: u32,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        if replay.is_empty() {
            warn!("repeat 범위에 재실행할 액션 없음: 무시");
            return Ok(());
        }
        let times = if times > MAX_REPEAT_TIMES {
            warn!(times, max = MAX_REPEAT_TIMES, "repeat 횟수 상한 적용");
            MAX_REPEAT_TIMES
        } else {
            times
        };

        for _ in 0..times {
            for kind in replay {
                cancel.sleep(self.action_delay).await?;
                self.perform(kind, cancel).await?;
            }
        }
        Ok(())
    }

    /// 단일 입력 액션 수행. 입력 실패는 경고로 흡수하고 취소만 전파한다.
    async fn perform(&self, kind: &ActionKind, cancel: &CancellationToken) -> Result<(), CoreError> {
        let driver = &self.driver;
        let result = match kind {
            ActionKind::MouseMove { x, y } => cancel.guard(driver.mouse_move(*x, *y)).await,
            ActionKind::MouseMoveRelative { dx, dy } => {
                cancel.guard(driver.mouse_move_relative(*dx, *dy)).await
            }
            ActionKind::MouseClickLeft => {
                cancel.guard(driver.mouse_click(MouseButton::Left, false)).await
            }
            ActionKind::MouseClickLeftDouble => {
                cancel.guard(driver.mouse_click(MouseButton::Left, true)).await
            }
            ActionKind::MouseClickRight => {
                cancel.guard(driver.mouse_click(MouseButton::Right, false)).await
            }
            ActionKind::DragSmooth { x, y } => cancel.guard(driver.drag_to(*x, *y)).await,
            ActionKind::ScrollSmooth { amount } => cancel.guard(driver.scroll(*amount)).await,
            ActionKind::KeyTap { key } => {
                let keys = split_combo(key);
                if keys.is_empty() {
                    warn!("빈 keyTap: 무시");
                    return Ok(());
                }
                cancel.guard(driver.hotkey(&keys)).await
            }
            ActionKind::KeyDown { key } => cancel.guard(driver.key_press(key)).await,
            ActionKind::KeyUp { key } => cancel.guard(driver.key_release(key)).await,
            ActionKind::PrintString { text } => cancel.guard(driver.type_text(text)).await,
            ActionKind::Nop { duration } => return cancel.sleep(*duration).await,
            ActionKind::Unknown { tag } => {
                warn!(tag = tag.as_str(), "지원하지 않는 액션: 무시");
                return Ok(());
            }
            ActionKind::StateUpdate | ActionKind::StopIteration | ActionKind::Repeat { .. } => {
                return Ok(())
            }
        };

        match result {
            Err(CoreError::Canceled) => Err(CoreError::Canceled),
            Err(e) => {
                warn!(action = kind.tag(), "입력 실패, 계속 진행: {e}");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}

/// repeat가 재실행할 액션.
///
/// `[first, last]`는 시퀀스 ID 범위이며 repeat 자신보다 앞이어야 한다.
/// 이미 실행된 입력 액션만 대상이고 흐름 제어 액션은 제외한다.
/// 범위가 잘못되었으면 빈 목록.
fn replay_range(executed: &[ActionSpec], own_id: u32, first: u32, last: u32) -> Vec<ActionKind> {
    if first > last || last >= own_id {
        warn!(first, last, own_id, "잘못된 repeat 범위");
        return Vec::new();
    }
    executed
        .iter()
        .filter(|a| (first..=last).contains(&a.sequence_id) && !a.kind.is_control())
        .map(|a| a.kind.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(seq: u32, kind: ActionKind) -> ActionSpec {
        ActionSpec::new(seq, kind)
    }

    #[test]
    fn replay_range_rejects_forward_reference() {
        let executed = vec![spec(1, ActionKind::MouseClickLeft)];
        assert!(replay_range(&executed, 2, 1, 2).is_empty());
        assert!(replay_range(&executed, 2, 3, 1).is_empty());
        assert_eq!(replay_range(&executed, 2, 1, 1), vec![ActionKind::MouseClickLeft]);
    }

    #[test]
    fn replay_range_skips_control_actions() {
        let executed = vec![
            spec(1, ActionKind::KeyTap { key: "a".into() }),
            spec(
                2,
                ActionKind::Repeat {
                    first: 1,
                    last: 1,
                    times: 1,
                },
            ),
            spec(3, ActionKind::KeyTap { key: "b".into() }),
        ];
        let replay = replay_range(&executed, 4, 1, 3);
        assert_eq!(replay.len(), 2);
    }
}
