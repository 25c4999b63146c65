//! DI 와이어링.
//!
//! 설정으로 어댑터를 만들고 `Arc<dyn Port>`로 워커와 오케스트레이터에 주입한다.

use std::sync::Arc;

use deskpilot_agent::{EventBus, TaskOrchestrator, TaskWorker};
use deskpilot_automation::executor::ActionExecutor;
use deskpilot_automation::input_driver::create_input_driver;
use deskpilot_core::config::AppConfig;
use deskpilot_core::error::CoreError;
use deskpilot_core::ports::notifier::NotificationSink;
use deskpilot_decision::{HttpChatClient, LlmDecisionService, TokenTracker};
use deskpilot_vision::analyzer::FrameAnalyzer;
use deskpilot_vision::capture::XcapScreenCapture;
use deskpilot_vision::local_ocr_provider::LocalOcrProvider;
use tracing::info;

/// 조립된 런타임
pub struct Runtime {
    pub orchestrator: TaskOrchestrator,
    pub events: Arc<EventBus>,
    pub tokens: Arc<TokenTracker>,
}

/// 설정으로 런타임 조립
pub fn build_runtime(config: &AppConfig) -> Result<Runtime, CoreError> {
    let events = Arc::new(EventBus::new(config.agent.event_capacity));
    let notifier: Arc<dyn NotificationSink> = events.clone();

    let driver = create_input_driver(config.input.driver);
    info!(platform = driver.platform(), "입력 드라이버 준비");
    let executor = Arc::new(ActionExecutor::new(
        driver,
        notifier.clone(),
        config.agent.action_delay(),
        config.agent.state_update_settle(),
    ));

    let ocr = LocalOcrProvider::from_config(&config.vision);
    info!(enabled = ocr.is_enabled(), "OCR 제공자 준비");

    let tokens = Arc::new(TokenTracker::new(Some(notifier.clone())));
    let client = HttpChatClient::new(&config.decision)?;
    let decision = LlmDecisionService::new(Arc::new(client), tokens.clone());

    let worker = TaskWorker::new(
        Arc::new(XcapScreenCapture::new()),
        Arc::new(ocr),
        Arc::new(FrameAnalyzer::new(config.vision.clone())),
        Arc::new(decision),
        executor,
        notifier.clone(),
        config.agent.clone(),
    );

    Ok(Runtime {
        orchestrator: TaskOrchestrator::new(worker, notifier),
        events,
        tokens,
    })
}
