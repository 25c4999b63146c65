//! 태스크 워커.
//!
//! 태스크 하나를 끝까지 실행한다.
//!
//! ```text
//! decompose_goal
//!   └─ 서브태스크마다 (최대 max_iterations 반복)
//!        capture → OCR → perceive
//!        (2번째 반복부터) OCR 델타 + 요약
//!        next_actions → execute_batch
//!        re-capture → 델타 + 요약 → verify_goal
//!        달성 → 다음 서브태스크 / 미달성 → 프롬프트 로그 추가, 대기 후 반복
//! ```
//!
//! 모든 외부 호출은 `CancellationToken::guard`를 거치고, CPU 단계 경계는 `checkpoint`로 끊는다.

use std::sync::Arc;

use deskpilot_automation::executor::{ActionExecutor, BatchScope};
use deskpilot_core::cancel::CancellationToken;
use deskpilot_core::config::{AgentConfig, IterationCapPolicy};
use deskpilot_core::error::CoreError;
use deskpilot_core::models::action::ActionSpec;
use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::models::geometry::Point;
use deskpilot_core::models::ocr::{OcrDelta, OcrRegion};
use deskpilot_core::models::perception::PerceptionSnapshot;
use deskpilot_core::models::task::{PromptLog, SubTask, SubtaskOutcome, TaskStatus};
use deskpilot_core::ports::capture::ScreenCapture;
use deskpilot_core::ports::decision::{ActionContext, DecisionService, VerificationContext};
use deskpilot_core::ports::notifier::NotificationSink;
use deskpilot_core::ports::ocr_provider::OcrProvider;
use deskpilot_vision::analyzer::FrameAnalyzer;
use deskpilot_vision::text_delta::produce_delta;
use tracing::{debug, error, info, warn};

use crate::assist::AssistMailbox;

pub const MSG_COMPLETED: &str = "Task completed successfully";
pub const MSG_CANCELED: &str = "Task canceled by user";
pub const MSG_CAPTURE_FAILED: &str = "Failed to capture screenshot";
pub const MSG_DECISION_FAILED: &str = "Failed to communicate with decision service";

/// 워커 종료 결과 (최종 상태 + 사람이 읽는 메시지)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcome {
    pub status: TaskStatus,
    pub message: String,
}

impl WorkerOutcome {
    pub fn new(status: TaskStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// 루프 중단 사유
#[derive(Debug)]
enum Halt {
    Core(CoreError),
    /// `fail` 정책에서 반복 상한 도달
    Exhausted(SubTask),
}

impl From<CoreError> for Halt {
    fn from(e: CoreError) -> Self {
        Halt::Core(e)
    }
}

/// 워커 한 번의 실행 범위
struct RunScope<'a> {
    task_id: &'a str,
    goal: &'a str,
    cancel: &'a CancellationToken,
    assists: &'a AssistMailbox,
}

/// 태스크 워커 (포트 묶음)
///
/// 모든 필드가 `Arc`이므로 복제 비용이 낮다.
#[derive(Clone)]
pub struct TaskWorker {
    capture: Arc<dyn ScreenCapture>,
    ocr: Arc<dyn OcrProvider>,
    analyzer: Arc<FrameAnalyzer>,
    decision: Arc<dyn DecisionService>,
    executor: Arc<ActionExecutor>,
    notifier: Arc<dyn NotificationSink>,
    config: AgentConfig,
}

impl TaskWorker {
    pub fn new(
        capture: Arc<dyn ScreenCapture>,
        ocr: Arc<dyn OcrProvider>,
        analyzer: Arc<FrameAnalyzer>,
        decision: Arc<dyn DecisionService>,
        executor: Arc<ActionExecutor>,
        notifier: Arc<dyn NotificationSink>,
        config: AgentConfig,
    ) -> Self {
        Self {
            capture,
            ocr,
            analyzer,
            decision,
            executor,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// 태스크 실행. 에러는 최종 상태로 변환되어 반환된다.
    pub async fn run(
        &self,
        task_id: &str,
        goal: &str,
        cancel: &CancellationToken,
        assists: &AssistMailbox,
    ) -> WorkerOutcome {
        let scope = RunScope {
            task_id,
            goal,
            cancel,
            assists,
        };

        match self.run_task(&scope).await {
            Ok(0) => WorkerOutcome::new(TaskStatus::Completed, MSG_COMPLETED),
            Ok(exhausted) => WorkerOutcome::new(
                TaskStatus::Completed,
                format!("{MSG_COMPLETED} ({exhausted} subtask(s) reached the iteration cap)"),
            ),
            Err(Halt::Exhausted(subtask)) => {
                error!(task_id, subtask_id = subtask.id, "반복 상한 도달, 태스크 실패 처리");
                WorkerOutcome::new(
                    TaskStatus::Broken,
                    format!(
                        "Subtask {} reached the iteration cap: {}",
                        subtask.id, subtask.description
                    ),
                )
            }
            Err(Halt::Core(CoreError::Canceled)) => {
                info!(task_id, "태스크 취소됨");
                WorkerOutcome::new(TaskStatus::Canceled, MSG_CANCELED)
            }
            Err(Halt::Core(CoreError::Capture(e))) => {
                error!(task_id, "스크린 캡처 실패: {e}");
                WorkerOutcome::new(TaskStatus::Broken, MSG_CAPTURE_FAILED)
            }
            Err(Halt::Core(CoreError::Network(e))) => {
                error!(task_id, "판단 서비스 통신 실패: {e}");
                WorkerOutcome::new(TaskStatus::Broken, MSG_DECISION_FAILED)
            }
            Err(Halt::Core(e)) => {
                error!(task_id, "태스크 실패: {e}");
                WorkerOutcome::new(TaskStatus::Broken, format!("Task failed: {e}"))
            }
        }
    }

    /// 반복 상한에 도달한 서브태스크 수를 반환
    async fn run_task(&self, scope: &RunScope<'_>) -> Result<usize, Halt> {
        let subtasks = self.decompose(scope).await?;
        let total = subtasks.len();
        self.log(scope, format!("Goal decomposed into {total} subtask(s)"));

        let mut exhausted = 0;
        for (index, subtask) in subtasks.into_iter().enumerate() {
            scope.cancel.checkpoint()?;
            info!(
                task_id = scope.task_id,
                subtask_id = subtask.id,
                "서브태스크 시작 ({}/{}): {}",
                index + 1,
                total,
                subtask.description
            );
            self.notifier.publish(AgentEvent::SubtaskUpdated {
                task_id: scope.task_id.to_string(),
                subtask_id: subtask.id,
                description: subtask.description.clone(),
                active: true,
                outcome: None,
            });

            let outcome = self.run_subtask(scope, &subtask).await?;

            self.notifier.publish(AgentEvent::SubtaskUpdated {
                task_id: scope.task_id.to_string(),
                subtask_id: subtask.id,
                description: subtask.description.clone(),
                active: false,
                outcome: Some(outcome),
            });

            if outcome == SubtaskOutcome::Exhausted {
                warn!(
                    task_id = scope.task_id,
                    subtask_id = subtask.id,
                    max_iterations = self.config.max_iterations,
                    "서브태스크 반복 상한 도달"
                );
                self.log(
                    scope,
                    format!("Subtask {} reached the iteration cap", subtask.id),
                );
                match self.config.on_iteration_cap {
                    IterationCapPolicy::Continue => exhausted += 1,
                    IterationCapPolicy::Fail => return Err(Halt::Exhausted(subtask)),
                }
            }
        }
        Ok(exhausted)
    }

    /// 목표 분해. 실패하거나 비어 있으면 목표 전체를 단일 서브태스크로 쓴다.
    async fn decompose(&self, scope: &RunScope<'_>) -> Result<Vec<SubTask>, CoreError> {
        let fallback = || vec![SubTask::new(1, scope.goal)];
        match scope
            .cancel
            .guard(self.decision.decompose_goal(scope.goal))
            .await
        {
            Ok(subtasks) if !subtasks.is_empty() => Ok(subtasks),
            Ok(_) => Ok(fallback()),
            Err(CoreError::Canceled) => Err(CoreError::Canceled),
            Err(e) => {
                warn!(task_id = scope.task_id, "목표 분해 실패, 단일 서브태스크 사용: {e}");
                Ok(fallback())
            }
        }
    }

    async fn run_subtask(
        &self,
        scope: &RunScope<'_>,
        subtask: &SubTask,
    ) -> Result<SubtaskOutcome, CoreError> {
        let cancel = scope.cancel;
        let mut prompt_log = PromptLog::starting_with(&subtask.description);
        let mut last_ocr: Option<Vec<OcrRegion>> = None;
        let mut previous_cursor: Option<Point> = self.cursor_position(cancel).await?;
        let mut previous_actions: Vec<ActionSpec> = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            cancel.checkpoint()?;
            debug!(
                task_id = scope.task_id,
                subtask_id = subtask.id,
                iteration,
                "반복 시작"
            );

            // 인식
            let before = self.perceive(cancel).await?;

            let (ocr_delta, delta_summary) = match &last_ocr {
                Some(previous) => {
                    let delta = produce_delta(previous, &before.ocr);
                    let summary = self.summarize(scope, &delta).await?;
                    (Some(delta), summary)
                }
                None => (None, None),
            };
            last_ocr = Some(before.ocr.clone());

            let description = match scope.assists.take(scope.task_id) {
                Some(assist) => {
                    info!(task_id = scope.task_id, "사용자 도움 메시지 주입: {}", assist.message);
                    self.log(scope, format!("Injecting user-assist message: {}", assist.message));
                    assist.apply_to(&subtask.description)
                }
                None => subtask.description.clone(),
            };

            // 판단
            let context = ActionContext {
                goal: scope.goal.to_string(),
                subtask: description.clone(),
                iteration,
                perception: before.clone(),
                ocr_delta,
                delta_summary,
                previous_cursor,
                prompt_log: prompt_log.clone(),
                previous_actions: std::mem::take(&mut previous_actions),
            };
            let actions = cancel.guard(self.decision.next_actions(&context)).await?;
            self.log(
                scope,
                format!("Iteration {iteration}: executing {} action(s)", actions.len()),
            );

            // 실행
            let report = self
                .executor
                .execute_batch(
                    actions,
                    BatchScope {
                        task_id: scope.task_id,
                        subtask_id: subtask.id,
                    },
                    cancel,
                )
                .await?;
            if let Some(reason) = report.halted_by {
                debug!(task_id = scope.task_id, iteration, ?reason, "배치 조기 중단");
            }

            // 검증
            let after = self.perceive(cancel).await?;
            let delta = produce_delta(&before.ocr, &after.ocr);
            let delta_summary = self.summarize(scope, &delta).await?;
            last_ocr = Some(after.ocr.clone());

            let ocr_near_cursor = after.ocr_near_cursor(self.config.cursor_band_px);
            let after_cursor = after.cursor;
            let verification = VerificationContext {
                goal: scope.goal.to_string(),
                subtask: description,
                iteration,
                perception: after,
                colors_before: before.colors,
                cursor_before: before.cursor,
                ocr_delta: delta,
                delta_summary,
                ocr_near_cursor,
                executed_actions: report.executed.clone(),
                prompt_log: prompt_log.clone(),
            };
            let verdict = cancel.guard(self.decision.verify_goal(&verification)).await?;

            if verdict.achieved {
                info!(
                    task_id = scope.task_id,
                    subtask_id = subtask.id,
                    iteration,
                    "서브태스크 달성: {}",
                    verdict.reason
                );
                self.log(scope, format!("Subtask {} achieved: {}", subtask.id, verdict.reason));
                return Ok(SubtaskOutcome::Achieved);
            }

            debug!(
                task_id = scope.task_id,
                iteration,
                reason = %verdict.reason,
                "서브태스크 미달성"
            );
            if !verdict.next_prompt.is_empty() {
                prompt_log.push(iteration, verdict.next_prompt);
            }
            previous_cursor = after_cursor;
            previous_actions = report.executed;
            cancel.sleep(self.config.iteration_delay()).await?;
        }

        Ok(SubtaskOutcome::Exhausted)
    }

    /// 입력 드라이버가 아는 커서 위치
    async fn cursor_position(&self, cancel: &CancellationToken) -> Result<Option<Point>, CoreError> {
        let driver = self.executor.driver();
        cancel
            .guard(async { Ok::<_, CoreError>(driver.cursor_position().await) })
            .await
    }

    /// 캡처 → OCR → 프레임 분석
    ///
    /// 캡처 실패는 모두 `CoreError::Capture`로 정규화한다. OCR 실패는 빈 결과로 대체한다.
    async fn perceive(&self, cancel: &CancellationToken) -> Result<PerceptionSnapshot, CoreError> {
        let frame = cancel
            .guard(self.capture.capture())
            .await
            .map_err(|e| match e {
                CoreError::Canceled | CoreError::Capture(_) => e,
                other => CoreError::Capture(other.to_string()),
            })?;

        let frame = if frame.cursor.is_none() {
            let cursor = self.cursor_position(cancel).await?;
            frame.with_cursor(cursor)
        } else {
            frame
        };

        let ocr = match cancel.guard(self.ocr.recognize(&frame)).await {
            Ok(regions) => regions,
            Err(CoreError::Canceled) => return Err(CoreError::Canceled),
            Err(e) => {
                warn!(provider = self.ocr.provider_name(), "OCR 실패, 빈 결과 사용: {e}");
                Vec::new()
            }
        };
        cancel.checkpoint()?;

        let analyzer = Arc::clone(&self.analyzer);
        let snapshot = tokio::task::spawn_blocking(move || analyzer.perceive(&frame, ocr))
            .await
            .map_err(|e| CoreError::Internal(format!("인식 작업 실패: {e}")))??;

        cancel.checkpoint()?;
        Ok(snapshot)
    }

    /// 델타 요약. 요약은 보조 정보이므로 통신 실패 시 생략한다.
    async fn summarize(
        &self,
        scope: &RunScope<'_>,
        delta: &OcrDelta,
    ) -> Result<Option<String>, CoreError> {
        match scope.cancel.guard(self.decision.summarize_delta(delta)).await {
            Ok(summary) => Ok(Some(summary)),
            Err(CoreError::Canceled) => Err(CoreError::Canceled),
            Err(e) => {
                warn!(task_id = scope.task_id, "OCR 델타 요약 실패: {e}");
                Ok(None)
            }
        }
    }

    fn log(&self, scope: &RunScope<'_>, message: String) {
        self.notifier.publish(AgentEvent::log(scope.task_id, message));
    }
}
