//! 태스크 오케스트레이터.
//!
//! 태스크 레지스트리, FIFO 대기열, 실행 슬롯을 하나의 뮤텍스 아래에 두고
//! 안전한 연산(submit / cancel / add_user_assist / 조회)만 노출한다.
//! 실행 슬롯이 비고 대기열이 비어 있지 않으면 디스패처가 선두 태스크를 워커로 넘긴다.
//!
//! 잠금 순서: `state` → `AssistMailbox` 내부 잠금. 잠금을 쥔 채로 `.await` 하지 않는다.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use deskpilot_core::cancel::CancellationToken;
use deskpilot_core::error::CoreError;
use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::models::task::{Task, TaskStatus};
use deskpilot_core::ports::notifier::NotificationSink;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::assist::AssistMailbox;
use crate::worker::{TaskWorker, WorkerOutcome, MSG_CANCELED};

/// 레지스트리 항목
struct Entry {
    task: Task,
    cancel: CancellationToken,
}

#[derive(Default)]
struct State {
    tasks: HashMap<String, Entry>,
    /// 생성 순서
    order: Vec<String>,
    queue: VecDeque<String>,
    running: Option<String>,
}

impl State {
    fn is_idle(&self) -> bool {
        self.running.is_none() && self.queue.is_empty()
    }
}

struct Inner {
    state: Mutex<State>,
    assists: AssistMailbox,
    worker: TaskWorker,
    notifier: Arc<dyn NotificationSink>,
    idle: Notify,
}

/// 태스크 오케스트레이터 (복제 시 같은 레지스트리를 공유)
#[derive(Clone)]
pub struct TaskOrchestrator {
    inner: Arc<Inner>,
}

impl TaskOrchestrator {
    pub fn new(worker: TaskWorker, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                assists: AssistMailbox::new(),
                worker,
                notifier,
                idle: Notify::new(),
            }),
        }
    }

    /// 새 태스크를 대기열에 넣고 디스패치한다.
    ///
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn submit(&self, goal: &str) -> Result<Task, CoreError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(CoreError::Validation {
                field: "goal".to_string(),
                message: "목표가 비어 있음".to_string(),
            });
        }

        let task = Task::new(goal);
        {
            let mut state = self.inner.state.lock();
            state.order.push(task.id.clone());
            state.queue.push_back(task.id.clone());
            state.tasks.insert(
                task.id.clone(),
                Entry {
                    task: task.clone(),
                    cancel: CancellationToken::new(),
                },
            );
        }

        info!(task_id = %task.id, "태스크 등록: {}", task.goal);
        self.inner.publish_status(&task);
        Inner::dispatch(&self.inner);
        Ok(task)
    }

    /// 태스크 취소
    ///
    /// - queued: 대기열에서 제거하고 즉시 `canceled`
    /// - running: 취소 신호만 보낸다. 워커가 다음 체크포인트에서 `canceled`로 끝낸다.
    /// - 종료 상태: 변경 없음
    pub fn cancel(&self, task_id: &str) -> Result<Task, CoreError> {
        let (snapshot, changed) = {
            let mut state = self.inner.state.lock();
            let status = state
                .tasks
                .get(task_id)
                .map(|entry| entry.task.status)
                .ok_or_else(|| not_found(task_id))?;

            match status {
                TaskStatus::Queued => {
                    state.queue.retain(|id| id != task_id);
                    let entry = state
                        .tasks
                        .get_mut(task_id)
                        .ok_or_else(|| not_found(task_id))?;
                    transition(&mut entry.task, TaskStatus::Canceled, MSG_CANCELED);
                    (entry.task.clone(), true)
                }
                TaskStatus::Running => {
                    let entry = state.tasks.get(task_id).ok_or_else(|| not_found(task_id))?;
                    entry.cancel.cancel();
                    (entry.task.clone(), false)
                }
                _ => {
                    let entry = state.tasks.get(task_id).ok_or_else(|| not_found(task_id))?;
                    (entry.task.clone(), false)
                }
            }
        };

        if changed {
            info!(task_id, "대기 중 태스크 취소");
            self.inner.publish_status(&snapshot);
            self.inner.notify_if_idle();
        } else if snapshot.status == TaskStatus::Running {
            info!(task_id, "실행 중 태스크에 취소 신호 전송");
        } else {
            debug!(task_id, status = %snapshot.status, "이미 종료된 태스크 취소 요청 무시");
        }
        Ok(snapshot)
    }

    /// 대기 중·실행 중인 모든 태스크 취소
    pub fn cancel_all(&self) {
        let ids: Vec<String> = {
            let state = self.inner.state.lock();
            state
                .order
                .iter()
                .filter(|id| {
                    state
                        .tasks
                        .get(*id)
                        .is_some_and(|entry| !entry.task.status.is_terminal())
                })
                .cloned()
                .collect()
        };
        for id in ids {
            if let Err(e) = self.cancel(&id) {
                warn!(task_id = %id, "취소 실패: {e}");
            }
        }
    }

    /// 실행 중인 태스크에 도움 메시지 등록 (미주입 메시지는 대체됨)
    pub fn add_user_assist(&self, task_id: &str, message: &str) -> Result<(), CoreError> {
        let state = self.inner.state.lock();
        let entry = state.tasks.get(task_id).ok_or_else(|| not_found(task_id))?;
        if entry.task.status != TaskStatus::Running {
            return Err(CoreError::Validation {
                field: "task_id".to_string(),
                message: format!("실행 중인 태스크가 아님 ({})", entry.task.status),
            });
        }
        if self.inner.assists.post(task_id, message).is_some() {
            debug!(task_id, "미주입 도움 메시지 대체");
        }
        info!(task_id, "사용자 도움 메시지 등록");
        Ok(())
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.inner
            .state
            .lock()
            .tasks
            .get(task_id)
            .map(|entry| entry.task.clone())
    }

    /// 생성 순서대로 모든 태스크
    pub fn tasks(&self) -> Vec<Task> {
        let state = self.inner.state.lock();
        state
            .order
            .iter()
            .filter_map(|id| state.tasks.get(id).map(|entry| entry.task.clone()))
            .collect()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn running_task(&self) -> Option<Task> {
        let state = self.inner.state.lock();
        state
            .running
            .as_ref()
            .and_then(|id| state.tasks.get(id))
            .map(|entry| entry.task.clone())
    }

    /// 실행 중 태스크도, 대기 태스크도 없을 때까지 대기
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inner.state.lock().is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    /// 실행 슬롯이 비어 있으면 대기열 선두를 실행한다.
    fn dispatch(this: &Arc<Inner>) {
        let next = {
            let mut state = this.state.lock();
            if state.running.is_some() {
                return;
            }
            let mut next = None;
            while let Some(id) = state.queue.pop_front() {
                let Some(entry) = state.tasks.get_mut(&id) else {
                    continue;
                };
                if !transition(&mut entry.task, TaskStatus::Running, "Task started") {
                    continue;
                }
                next = Some((entry.task.clone(), entry.cancel.clone()));
                state.running = Some(id);
                break;
            }
            next
        };

        let Some((task, cancel)) = next else {
            this.notify_if_idle();
            return;
        };

        info!(task_id = %task.id, "태스크 실행 시작");
        this.publish_status(&task);

        let inner = Arc::clone(this);
        tokio::spawn(async move {
            let worker = inner.worker.clone();
            let handle = {
                let inner = Arc::clone(&inner);
                let task_id = task.id.clone();
                let goal = task.goal.clone();
                tokio::spawn(async move {
                    worker
                        .run(&task_id, &goal, &cancel, &inner.assists)
                        .await
                })
            };
            let outcome = handle.await.unwrap_or_else(|e| {
                warn!(task_id = %task.id, "워커 비정상 종료: {e}");
                WorkerOutcome::new(TaskStatus::Broken, format!("Task failed: {e}"))
            });
            inner.finish(&task.id, outcome);
            Inner::dispatch(&inner);
        });
    }

    /// 워커 종료 처리: 최종 상태 기록, 실행 슬롯 해제, 남은 도움 메시지 폐기
    fn finish(&self, task_id: &str, outcome: WorkerOutcome) {
        let snapshot = {
            let mut state = self.state.lock();
            if state.running.as_deref() == Some(task_id) {
                state.running = None;
            }
            self.assists.discard(task_id);
            state.tasks.get_mut(task_id).map(|entry| {
                transition(&mut entry.task, outcome.status, &outcome.message);
                entry.task.clone()
            })
        };

        if let Some(task) = snapshot {
            info!(task_id, status = %task.status, "태스크 종료: {}", task.message);
            self.publish_status(&task);
        }
    }

    fn publish_status(&self, task: &Task) {
        self.notifier.publish(AgentEvent::TaskUpdated {
            task_id: task.id.clone(),
            status: task.status,
            message: task.message.clone(),
        });
    }

    fn notify_if_idle(&self) {
        if self.state.lock().is_idle() {
            self.idle.notify_waiters();
        }
    }
}

/// 허용된 전이만 적용한다
fn transition(task: &mut Task, next: TaskStatus, message: &str) -> bool {
    if !task.status.can_transition_to(next) {
        warn!(
            task_id = %task.id,
            from = %task.status,
            to = %next,
            "허용되지 않는 상태 전이 무시"
        );
        return false;
    }
    task.status = next;
    task.message = message.to_string();
    task.updated_at = Utc::now();
    true
}

fn not_found(task_id: &str) -> CoreError {
    CoreError::NotFound {
        resource_type: "Task".to_string(),
        id: task_id.to_string(),
    }
}
