//! 오케스트레이터 흐름 통합 테스트.
//!
//! 캡처/OCR/판단 포트를 목으로 바꾸고 실제 워커, 실행기(NoOp 드라이버), 프레임 분석기로
//! 대기열 디스패치, 취소, 실패 매핑, 반복 상한 정책, 사용자 도움 메시지를 검증한다.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskpilot_agent::worker::{MSG_CANCELED, MSG_CAPTURE_FAILED, MSG_COMPLETED, MSG_DECISION_FAILED};
use deskpilot_agent::{TaskOrchestrator, TaskWorker};
use deskpilot_automation::executor::ActionExecutor;
use deskpilot_automation::input_driver::NoOpInputDriver;
use deskpilot_core::config::{AgentConfig, IterationCapPolicy};
use deskpilot_core::error::CoreError;
use deskpilot_core::models::action::{ActionKind, ActionSpec};
use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::models::frame::Frame;
use deskpilot_core::models::geometry::{Point, Rect};
use deskpilot_core::models::ocr::{OcrDelta, OcrRegion};
use deskpilot_core::models::task::{SubTask, SubtaskOutcome, TaskStatus};
use deskpilot_core::ports::capture::ScreenCapture;
use deskpilot_core::ports::decision::{
    ActionContext, DecisionService, Verdict, VerificationContext,
};
use deskpilot_core::ports::input_driver::{InputDriver, MouseButton};
use deskpilot_core::ports::notifier::NotificationSink;
use deskpilot_core::ports::ocr_provider::OcrProvider;
use deskpilot_vision::analyzer::FrameAnalyzer;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

// ============================================================
// 목 포트
// ============================================================

struct MockCapture {
    fail: bool,
}

#[async_trait]
impl ScreenCapture for MockCapture {
    async fn capture(&self) -> Result<Frame, CoreError> {
        if self.fail {
            return Err(CoreError::Capture("디스플레이 없음".into()));
        }
        Frame::new(40, 30, vec![255; 40 * 30 * 4])
    }
}

struct MockOcr;

#[async_trait]
impl OcrProvider for MockOcr {
    async fn recognize(&self, _frame: &Frame) -> Result<Vec<OcrRegion>, CoreError> {
        Ok(vec![OcrRegion::new("hello", Rect::new(0, 0, 10, 10), 90.0)])
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

/// 판단 서비스 목
///
/// `gate`가 있으면 목표 분해가 허가를 받을 때까지 멈춘다.
#[derive(Default)]
struct MockDecision {
    subtasks: Vec<&'static str>,
    gate: Option<Arc<Semaphore>>,
    /// 검증 결과 (비면 달성)
    verdicts: Mutex<VecDeque<bool>>,
    never_achieved: bool,
    actions_fail: bool,
    decomposed: Mutex<Vec<String>>,
    action_subtasks: Mutex<Vec<String>>,
}

#[async_trait]
impl DecisionService for MockDecision {
    async fn decompose_goal(&self, goal: &str) -> Result<Vec<SubTask>, CoreError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|e| CoreError::Internal(e.to_string()))?;
        }
        self.decomposed.lock().push(goal.to_string());
        Ok(self
            .subtasks
            .iter()
            .enumerate()
            .map(|(i, s)| SubTask::new(i as u32 + 1, *s))
            .collect())
    }

    async fn summarize_delta(&self, _delta: &OcrDelta) -> Result<String, CoreError> {
        Ok("변화 없음".into())
    }

    async fn next_actions(&self, context: &ActionContext) -> Result<Vec<ActionSpec>, CoreError> {
        self.action_subtasks.lock().push(context.subtask.clone());
        if self.actions_fail {
            return Err(CoreError::Network("connection refused".into()));
        }
        Ok(vec![
            ActionSpec::new(1, ActionKind::MouseMove { x: 5, y: 5 }),
            ActionSpec::new(2, ActionKind::MouseClickLeft),
        ])
    }

    async fn verify_goal(&self, _context: &VerificationContext) -> Result<Verdict, CoreError> {
        let achieved = !self.never_achieved && self.verdicts.lock().pop_front().unwrap_or(true);
        Ok(Verdict {
            achieved,
            reason: "테스트".into(),
            next_prompt: if achieved { String::new() } else { "다시 시도".into() },
        })
    }
}

/// 커서 조회가 끝나지 않는 입력 드라이버. 조회에 들어오면 `entered`를 알린다.
struct StuckCursorDriver {
    entered: Arc<Notify>,
}

#[async_trait]
impl InputDriver for StuckCursorDriver {
    async fn mouse_move(&self, _x: i32, _y: i32) -> Result<(), CoreError> {
        Ok(())
    }

    async fn mouse_move_relative(&self, _dx: i32, _dy: i32) -> Result<(), CoreError> {
        Ok(())
    }

    async fn mouse_click(&self, _button: MouseButton, _double: bool) -> Result<(), CoreError> {
        Ok(())
    }

    async fn drag_to(&self, _x: i32, _y: i32) -> Result<(), CoreError> {
        Ok(())
    }

    async fn scroll(&self, _amount: i32) -> Result<(), CoreError> {
        Ok(())
    }

    async fn type_text(&self, _text: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn key_press(&self, _key: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn key_release(&self, _key: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn hotkey(&self, _keys: &[String]) -> Result<(), CoreError> {
        Ok(())
    }

    async fn cursor_position(&self) -> Option<Point> {
        self.entered.notify_one();
        std::future::pending::<Option<Point>>().await
    }

    fn platform(&self) -> &str {
        "stuck"
    }
}

#[derive(Default)]
struct Collector {
    events: Mutex<Vec<AgentEvent>>,
}

impl NotificationSink for Collector {
    fn publish(&self, event: AgentEvent) {
        self.events.lock().push(event);
    }
}

impl Collector {
    /// (task_id, status) 순서열
    fn statuses(&self) -> Vec<(String, TaskStatus)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                AgentEvent::TaskUpdated {
                    task_id, status, ..
                } => Some((task_id.clone(), *status)),
                _ => None,
            })
            .collect()
    }
}

// ============================================================
// 헬퍼
// ============================================================

fn fast_config() -> AgentConfig {
    AgentConfig {
        iteration_delay_ms: 0,
        action_delay_ms: 0,
        state_update_settle_ms: 0,
        ..AgentConfig::default()
    }
}

fn build(
    decision: Arc<MockDecision>,
    capture_fails: bool,
    config: AgentConfig,
) -> (TaskOrchestrator, Arc<Collector>) {
    build_with_driver(decision, capture_fails, config, Arc::new(NoOpInputDriver::new()))
}

fn build_with_driver(
    decision: Arc<MockDecision>,
    capture_fails: bool,
    config: AgentConfig,
    driver: Arc<dyn InputDriver>,
) -> (TaskOrchestrator, Arc<Collector>) {
    let sink = Arc::new(Collector::default());
    let executor = Arc::new(ActionExecutor::new(
        driver,
        sink.clone(),
        Duration::ZERO,
        Duration::ZERO,
    ));
    let worker = TaskWorker::new(
        Arc::new(MockCapture {
            fail: capture_fails,
        }),
        Arc::new(MockOcr),
        Arc::new(FrameAnalyzer::default()),
        decision,
        executor,
        sink.clone(),
        config,
    );
    (TaskOrchestrator::new(worker, sink.clone()), sink)
}

async fn settle(orchestrator: &TaskOrchestrator) {
    tokio::time::timeout(Duration::from_secs(20), orchestrator.wait_idle())
        .await
        .expect("오케스트레이터가 유휴 상태가 되지 않음");
}

// ============================================================
// 테스트
// ============================================================

#[tokio::test]
async fn task_runs_all_subtasks_to_completion() {
    let decision = Arc::new(MockDecision {
        subtasks: vec!["메뉴 열기", "터미널 클릭"],
        ..Default::default()
    });
    let (orchestrator, sink) = build(decision.clone(), false, fast_config());

    let task = orchestrator.submit("터미널 열기").unwrap();
    settle(&orchestrator).await;

    let done = orchestrator.task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.message, MSG_COMPLETED);

    let outcomes: Vec<SubtaskOutcome> = sink
        .events
        .lock()
        .iter()
        .filter_map(|e| match e {
            AgentEvent::SubtaskUpdated { outcome, .. } => *outcome,
            _ => None,
        })
        .collect();
    assert_eq!(outcomes, vec![SubtaskOutcome::Achieved, SubtaskOutcome::Achieved]);

    let executed = sink
        .events
        .lock()
        .iter()
        .filter(|e| matches!(e, AgentEvent::ActionExecuted { .. }))
        .count();
    assert_eq!(executed, 4);
}

#[tokio::test]
async fn empty_decomposition_falls_back_to_goal() {
    let decision = Arc::new(MockDecision::default());
    let (orchestrator, _sink) = build(decision.clone(), false, fast_config());

    orchestrator.submit("메모장 열기").unwrap();
    settle(&orchestrator).await;

    assert_eq!(decision.action_subtasks.lock().as_slice(), ["메모장 열기"]);
}

#[tokio::test]
async fn only_one_task_runs_at_a_time_in_fifo_order() {
    let gate = Arc::new(Semaphore::new(0));
    let decision = Arc::new(MockDecision {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let (orchestrator, sink) = build(decision.clone(), false, fast_config());

    let a = orchestrator.submit("A").unwrap();
    let b = orchestrator.submit("B").unwrap();
    let c = orchestrator.submit("C").unwrap();

    assert_eq!(orchestrator.running_task().unwrap().id, a.id);
    assert_eq!(orchestrator.queue_len(), 2);
    let running = orchestrator
        .tasks()
        .iter()
        .filter(|t| t.status == TaskStatus::Running)
        .count();
    assert_eq!(running, 1);

    gate.add_permits(100);
    settle(&orchestrator).await;

    assert_eq!(decision.decomposed.lock().as_slice(), ["A", "B", "C"]);

    // 실행 시작 전에는 항상 이전 태스크가 종료되어 있어야 한다
    let mut active = 0;
    for (_, status) in sink.statuses() {
        match status {
            TaskStatus::Running => {
                active += 1;
                assert_eq!(active, 1, "동시에 둘 이상 실행됨");
            }
            s if s.is_terminal() => active -= 1,
            _ => {}
        }
    }
    let ids: Vec<String> = orchestrator.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[tokio::test]
async fn canceled_queued_task_is_never_dispatched() {
    let gate = Arc::new(Semaphore::new(0));
    let decision = Arc::new(MockDecision {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let (orchestrator, sink) = build(decision.clone(), false, fast_config());

    let first = orchestrator.submit("first").unwrap();
    let second = orchestrator.submit("second").unwrap();

    let canceled = orchestrator.cancel(&second.id).unwrap();
    assert_eq!(canceled.status, TaskStatus::Canceled);
    assert_eq!(canceled.message, MSG_CANCELED);
    assert_eq!(orchestrator.queue_len(), 0);

    gate.add_permits(100);
    settle(&orchestrator).await;

    assert_eq!(orchestrator.task(&first.id).unwrap().status, TaskStatus::Completed);
    assert_eq!(orchestrator.task(&second.id).unwrap().status, TaskStatus::Canceled);
    assert_eq!(decision.decomposed.lock().as_slice(), ["first"]);
    assert!(!sink
        .statuses()
        .contains(&(second.id.clone(), TaskStatus::Running)));
}

#[tokio::test]
async fn canceling_running_task_ends_at_checkpoint() {
    let gate = Arc::new(Semaphore::new(0));
    let decision = Arc::new(MockDecision {
        gate: Some(gate),
        ..Default::default()
    });
    let (orchestrator, _sink) = build(decision, false, fast_config());

    let task = orchestrator.submit("오래 걸리는 작업").unwrap();
    let snapshot = orchestrator.cancel(&task.id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Running);

    settle(&orchestrator).await;

    let done = orchestrator.task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Canceled);
    assert_eq!(done.message, MSG_CANCELED);

    // 종료된 태스크 취소는 변경 없음
    let again = orchestrator.cancel(&task.id).unwrap();
    assert_eq!(again.status, TaskStatus::Canceled);
}

#[tokio::test]
async fn cancel_interrupts_pending_cursor_lookup() {
    let entered = Arc::new(Notify::new());
    let decision = Arc::new(MockDecision::default());
    let (orchestrator, _sink) = build_with_driver(
        decision,
        false,
        fast_config(),
        Arc::new(StuckCursorDriver {
            entered: entered.clone(),
        }),
    );

    let task = orchestrator.submit("커서 확인").unwrap();
    tokio::time::timeout(Duration::from_secs(5), entered.notified())
        .await
        .expect("커서 조회에 도달하지 않음");
    orchestrator.cancel(&task.id).unwrap();

    settle(&orchestrator).await;

    let done = orchestrator.task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Canceled);
    assert_eq!(done.message, MSG_CANCELED);
}

#[tokio::test]
async fn capture_failure_breaks_task_and_queue_continues() {
    let decision = Arc::new(MockDecision::default());
    let (orchestrator, _sink) = build(decision, true, fast_config());

    let a = orchestrator.submit("a").unwrap();
    let b = orchestrator.submit("b").unwrap();
    settle(&orchestrator).await;

    for id in [&a.id, &b.id] {
        let task = orchestrator.task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Broken);
        assert_eq!(task.message, MSG_CAPTURE_FAILED);
    }
}

#[tokio::test]
async fn decision_failure_breaks_task() {
    let decision = Arc::new(MockDecision {
        actions_fail: true,
        ..Default::default()
    });
    let (orchestrator, _sink) = build(decision, false, fast_config());

    let task = orchestrator.submit("x").unwrap();
    settle(&orchestrator).await;

    let done = orchestrator.task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Broken);
    assert_eq!(done.message, MSG_DECISION_FAILED);
}

#[tokio::test]
async fn iteration_cap_continue_policy_completes() {
    let decision = Arc::new(MockDecision {
        subtasks: vec!["불가능", "가능"],
        verdicts: Mutex::new(VecDeque::from(vec![false, false, true])),
        ..Default::default()
    });
    let config = AgentConfig {
        max_iterations: 2,
        ..fast_config()
    };
    let (orchestrator, sink) = build(decision.clone(), false, config);

    let task = orchestrator.submit("goal").unwrap();
    settle(&orchestrator).await;

    let done = orchestrator.task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(done.message.contains("1 subtask(s)"));
    assert_eq!(decision.action_subtasks.lock().len(), 3);

    let outcomes: Vec<SubtaskOutcome> = sink
        .events
        .lock()
        .iter()
        .filter_map(|e| match e {
            AgentEvent::SubtaskUpdated { outcome, .. } => *outcome,
            _ => None,
        })
        .collect();
    assert_eq!(outcomes, vec![SubtaskOutcome::Exhausted, SubtaskOutcome::Achieved]);
}

#[tokio::test]
async fn iteration_cap_fail_policy_breaks() {
    let decision = Arc::new(MockDecision {
        subtasks: vec!["불가능", "도달하지 않음"],
        never_achieved: true,
        ..Default::default()
    });
    let config = AgentConfig {
        max_iterations: 3,
        on_iteration_cap: IterationCapPolicy::Fail,
        ..fast_config()
    };
    let (orchestrator, _sink) = build(decision.clone(), false, config);

    let task = orchestrator.submit("goal").unwrap();
    settle(&orchestrator).await;

    let done = orchestrator.task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Broken);
    assert!(done.message.contains("불가능"));
    assert_eq!(decision.action_subtasks.lock().len(), 3);
}

#[tokio::test]
async fn user_assist_is_injected_exactly_once() {
    let gate = Arc::new(Semaphore::new(0));
    let decision = Arc::new(MockDecision {
        gate: Some(gate.clone()),
        verdicts: Mutex::new(VecDeque::from(vec![false, true])),
        ..Default::default()
    });
    let (orchestrator, _sink) = build(decision.clone(), false, fast_config());

    let running = orchestrator.submit("open firefox").unwrap();
    let queued = orchestrator.submit("later").unwrap();

    assert!(matches!(
        orchestrator.add_user_assist(&queued.id, "무시됨"),
        Err(CoreError::Validation { .. })
    ));
    assert!(matches!(
        orchestrator.add_user_assist("task-missing", "x"),
        Err(CoreError::NotFound { .. })
    ));

    orchestrator.add_user_assist(&running.id, "first hint").unwrap();
    orchestrator.add_user_assist(&running.id, "use the dock").unwrap();

    gate.add_permits(100);
    settle(&orchestrator).await;

    let requests = decision.action_subtasks.lock().clone();
    assert_eq!(
        requests[0],
        "open firefox\n\nHELPER MESSAGE FROM THE USER: use the dock"
    );
    assert_eq!(requests[1], "open firefox");
    assert_eq!(requests[2], "later");
}

#[tokio::test]
async fn empty_goal_is_rejected() {
    let (orchestrator, _sink) = build(Arc::new(MockDecision::default()), false, fast_config());
    assert!(matches!(
        orchestrator.submit("   "),
        Err(CoreError::Validation { .. })
    ));
    assert!(orchestrator.tasks().is_empty());
}
