//! LLM 채팅 API 클라이언트.
//!
//! 판단 서비스 요청은 모두 "메시지 목록 → 응답 텍스트" 한 번의 호출로 표현된다.
//! `ChatClient` 트레이트 뒤에 전송 계층을 숨겨 테스트에서 교체할 수 있게 한다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use deskpilot_core::config::{AiProviderType, DecisionConfig};
use deskpilot_core::error::CoreError;

/// 채팅 메시지 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system" | "user" | "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 채팅 완성 전송 계층
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// 메시지 목록을 보내고 응답 텍스트를 받는다. 실패는 `CoreError::Network`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CoreError>;

    /// 모델 이름 (로그용)
    fn model(&self) -> &str;
}

// ============================================================
// HttpChatClient: reqwest 기반
// ============================================================

/// HTTP 채팅 클라이언트
///
/// 지원 API:
/// - Anthropic: `POST /v1/messages` (system 분리, `x-api-key`)
/// - OpenAI 호환: `POST /v1/chat/completions` (Bearer)
/// - Generic: OpenAI 형식 요청, 응답은 여러 형식을 순서대로 시도
#[derive(Debug)]
pub struct HttpChatClient {
    http_client: reqwest::Client,
    endpoint: String,
    /// API 키 (메모리에만 유지)
    api_key: String,
    model: String,
    provider_type: AiProviderType,
    max_tokens: u32,
    temperature: f32,
}

impl HttpChatClient {
    /// 설정으로 클라이언트 생성. Anthropic은 API 키가 필수다.
    pub fn new(config: &DecisionConfig) -> Result<Self, CoreError> {
        if config.provider_type == AiProviderType::Anthropic && config.api_key.is_empty() {
            return Err(CoreError::Config(
                "Anthropic API 키 미설정. config.json 또는 DESKPILOT_API_KEY로 지정하세요.".into(),
            ));
        }
        if config.endpoint.is_empty() {
            return Err(CoreError::Config("판단 서비스 엔드포인트 미설정".into()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        debug!(
            endpoint = %config.endpoint,
            model = %config.model,
            timeout = config.timeout_secs,
            "HttpChatClient 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            provider_type: config.provider_type,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        if self.provider_type == AiProviderType::Anthropic {
            let system: Vec<&str> = messages
                .iter()
                .filter(|m| m.role == "system")
                .map(|m| m.content.as_str())
                .collect();
            let rest: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();
            serde_json::json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": system.join("\n\n"),
                "messages": rest,
            })
        } else {
            serde_json::json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "messages": messages,
            })
        }
    }

    /// 응답 본문에서 텍스트 추출
    fn response_text(&self, body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            CoreError::Network(format!("LLM 응답 JSON 파싱 실패: {e}"))
        })?;

        let text = match self.provider_type {
            AiProviderType::Anthropic => claude_text(&response),
            AiProviderType::OpenAi => openai_text(&response),
            AiProviderType::Generic => openai_text(&response)
                .or_else(|| claude_text(&response))
                .or_else(|| {
                    response
                        .get("response")
                        .and_then(|t| t.as_str())
                        .map(str::to_string)
                }),
        };
        text.ok_or_else(|| CoreError::Network("LLM 응답에서 텍스트를 찾을 수 없음".to_string()))
    }
}

/// content[0].text
fn claude_text(response: &serde_json::Value) -> Option<String> {
    response
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|block| block.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
}

/// choices[0].message.content
fn openai_text(response: &serde_json::Value) -> Option<String> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CoreError> {
        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            messages = messages.len(),
            "LLM API 호출"
        );

        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&self.request_body(messages));

        if self.provider_type == AiProviderType::Anthropic {
            builder = builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01");
        } else if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("LLM API 호출 실패: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("LLM API 응답 읽기 실패: {e}")))?;

        if !status.is_success() {
            warn!(status = %status, "LLM API 오류 응답");
            return Err(CoreError::Network(format!(
                "LLM API 오류 ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        self.response_text(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================
// 테스트
// ============================================================
