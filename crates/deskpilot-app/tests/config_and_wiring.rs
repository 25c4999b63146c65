//! 설정 및 DI 와이어링 통합 테스트.
//!
//! AppConfig → 어댑터 생성, 설정 파일 저장/로드 검증.

use std::sync::Arc;

use deskpilot_agent::{EventBus, TaskOrchestrator, TaskWorker};
use deskpilot_automation::executor::ActionExecutor;
use deskpilot_automation::input_driver::create_input_driver;
use deskpilot_core::config::{AiProviderType, AppConfig, InputDriverKind, IterationCapPolicy};
use deskpilot_core::config_manager::ConfigManager;
use deskpilot_core::ports::notifier::NotificationSink;
use deskpilot_decision::{HttpChatClient, LlmDecisionService, TokenTracker};
use deskpilot_vision::analyzer::FrameAnalyzer;
use deskpilot_vision::capture::XcapScreenCapture;
use deskpilot_vision::local_ocr_provider::LocalOcrProvider;

#[test]
fn config_defaults_are_valid() {
    let config = AppConfig::default_config();

    // 비전 설정
    assert!(config.vision.report_colors > 0);
    assert!(config.vision.region_colors > 0);
    assert!(config.vision.glyph_min_height > 0);
    assert!(config.vision.panel_min_height >= config.vision.glyph_min_height);

    // 에이전트 설정
    assert!(config.agent.max_iterations > 0);
    assert!(config.agent.cursor_band_px > 0);
    assert!(config.agent.event_capacity > 0);
    assert_eq!(config.agent.on_iteration_cap, IterationCapPolicy::Continue);

    // 판단 서비스 설정
    assert_eq!(config.decision.provider_type, AiProviderType::OpenAi);
    assert!(config.decision.endpoint.starts_with("http"));
    assert!((config.decision.temperature - 0.5).abs() < f32::EPSILON);

    // 기본은 실제 입력 없이 실행
    assert_eq!(config.input.driver, InputDriverKind::Noop);
}

#[test]
fn config_duration_conversions() {
    let config = AppConfig::default_config();

    assert_eq!(
        config.agent.iteration_delay().as_millis(),
        u128::from(config.agent.iteration_delay_ms)
    );
    assert_eq!(
        config.agent.action_delay().as_millis(),
        u128::from(config.agent.action_delay_ms)
    );
    assert_eq!(
        config.agent.state_update_settle().as_millis(),
        u128::from(config.agent.state_update_settle_ms)
    );
    assert_eq!(
        config.decision.request_timeout().as_secs(),
        config.decision.timeout_secs
    );
}

#[test]
fn config_manager_creates_and_persists_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let manager = ConfigManager::with_path(path.clone()).unwrap();
    assert!(path.exists());
    assert_eq!(manager.config_path(), path.as_path());

    manager
        .update_with(|config| {
            config.agent.max_iterations = 7;
            config.decision.model = "local-model".to_string();
        })
        .unwrap();

    let reopened = ConfigManager::with_path(path).unwrap();
    let config = reopened.get();
    assert_eq!(config.agent.max_iterations, 7);
    assert_eq!(config.decision.model, "local-model");
}

#[test]
fn partial_config_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "agent": { "max_iterations": 3 } }"#).unwrap();

    let config = ConfigManager::with_path(path).unwrap().get();
    let defaults = AppConfig::default_config();

    assert_eq!(config.agent.max_iterations, 3);
    assert_eq!(config.agent.cursor_band_px, defaults.agent.cursor_band_px);
    assert_eq!(config.decision.endpoint, defaults.decision.endpoint);
    assert_eq!(config.vision.report_colors, defaults.vision.report_colors);
}

#[test]
fn reload_picks_up_external_edit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let manager = ConfigManager::with_path(path.clone()).unwrap();

    std::fs::write(&path, r#"{ "input": { "driver": "enigo" } }"#).unwrap();
    manager.reload().unwrap();

    assert_eq!(manager.get().input.driver, InputDriverKind::Enigo);
}

#[tokio::test]
async fn all_adapters_instantiate_from_config() {
    let config = AppConfig::default_config();

    let events = Arc::new(EventBus::new(config.agent.event_capacity));
    let notifier: Arc<dyn NotificationSink> = events.clone();

    // 입력: 기본 NoOp
    let driver = create_input_driver(config.input.driver);
    let executor = Arc::new(ActionExecutor::new(
        driver,
        notifier.clone(),
        config.agent.action_delay(),
        config.agent.state_update_settle(),
    ));

    // 판단 서비스: OpenAI 호환은 키 없이도 생성
    let tokens = Arc::new(TokenTracker::new(Some(notifier.clone())));
    let client = HttpChatClient::new(&config.decision).unwrap();
    let decision = LlmDecisionService::new(Arc::new(client), tokens.clone());

    let worker = TaskWorker::new(
        Arc::new(XcapScreenCapture::new()),
        Arc::new(LocalOcrProvider::from_config(&config.vision)),
        Arc::new(FrameAnalyzer::new(config.vision.clone())),
        Arc::new(decision),
        executor,
        notifier.clone(),
        config.agent.clone(),
    );
    let orchestrator = TaskOrchestrator::new(worker, notifier);

    assert!(orchestrator.tasks().is_empty());
    assert_eq!(orchestrator.queue_len(), 0);
    assert!(orchestrator.running_task().is_none());
    assert_eq!(tokens.total(), 0);
}

#[test]
fn anthropic_provider_requires_api_key() {
    let mut config = AppConfig::default_config();
    config.decision.provider_type = AiProviderType::Anthropic;
    assert!(HttpChatClient::new(&config.decision).is_err());

    config.decision.api_key = "sk-ant-test".to_string();
    assert!(HttpChatClient::new(&config.decision).is_ok());
}
