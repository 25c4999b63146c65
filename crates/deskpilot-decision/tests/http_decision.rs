//! HTTP 채팅 클라이언트 + 판단 서비스 통합 테스트 (mockito).

use std::sync::Arc;

use deskpilot_core::config::{AiProviderType, DecisionConfig};
use deskpilot_core::error::CoreError;
use deskpilot_core::models::action::ActionKind;
use deskpilot_core::models::perception::PerceptionSnapshot;
use deskpilot_core::models::task::PromptLog;
use deskpilot_core::ports::decision::{ActionContext, DecisionService};
use deskpilot_decision::{HttpChatClient, LlmDecisionService, TokenTracker};
use mockito::Matcher;

fn config(server: &mockito::ServerGuard, provider_type: AiProviderType, path: &str) -> DecisionConfig {
    DecisionConfig {
        provider_type,
        endpoint: format!("{}{}", server.url(), path),
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..DecisionConfig::default()
    }
}

fn service(config: &DecisionConfig) -> LlmDecisionService {
    let client = HttpChatClient::new(config).unwrap();
    LlmDecisionService::new(Arc::new(client), Arc::new(TokenTracker::default()))
}

fn context() -> ActionContext {
    ActionContext {
        goal: "터미널 열기".into(),
        subtask: "터미널 열기".into(),
        iteration: 1,
        perception: PerceptionSnapshot::default(),
        ocr_delta: None,
        delta_summary: None,
        previous_cursor: None,
        prompt_log: PromptLog::starting_with("터미널 열기"),
        previous_actions: Vec::new(),
    }
}

#[tokio::test]
async fn openai_actions_from_fenced_reply() {
    let mut server = mockito::Server::new_async().await;
    let reply = serde_json::json!({
        "choices": [{
            "message": {
                "content": "좋습니다.\n```json\n[{\"actionSequenceID\": 1, \"action\": \"keyTap\", \"keyTapString\": \"ctrl+alt+t\"}]\n```"
            }
        }]
    });
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "test-model",
            "temperature": 0.5
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(reply.to_string())
        .create_async()
        .await;

    let svc = service(&config(&server, AiProviderType::OpenAi, "/v1/chat/completions"));
    let actions = svc.next_actions(&context()).await.unwrap();

    assert_eq!(actions.len(), 1);
    assert_eq!(
        actions[0].kind,
        ActionKind::KeyTap {
            key: "ctrl+alt+t".into()
        }
    );
    assert!(svc.tokens().total() > 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn anthropic_verdict_with_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content":[{"type":"text","text":"{\"isGoalAchieved\": true, \"description\": \"터미널 창이 보임\"}"}]}"#,
        )
        .create_async()
        .await;

    let svc = service(&config(&server, AiProviderType::Anthropic, "/v1/messages"));
    let subtasks = svc.decompose_goal("터미널 열기").await.unwrap();

    // 객체 응답은 목록이 아니므로 목표 전체가 단일 서브태스크가 된다
    assert_eq!(subtasks.len(), 1);
    assert_eq!(subtasks[0].description, "터미널 열기");
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_is_network_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let svc = service(&config(&server, AiProviderType::OpenAi, "/v1/chat/completions"));
    let result = svc.decompose_goal("아무 목표").await;

    assert!(matches!(result, Err(CoreError::Network(_))));
    mock.assert_async().await;
}
