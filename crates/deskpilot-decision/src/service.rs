//! LLM 기반 판단 서비스.
//!
//! 요청마다 프롬프트 구성 → 채팅 호출 → JSON 복구 → 기본값 대체 순서로 처리한다.
//! 요청/응답 텍스트는 모두 토큰 집계기에 기록된다.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use deskpilot_core::error::CoreError;
use deskpilot_core::models::action::{ActionKind, ActionSpec};
use deskpilot_core::models::ocr::OcrDelta;
use deskpilot_core::models::task::SubTask;
use deskpilot_core::ports::decision::{
    ActionContext, DecisionService, Verdict, VerificationContext,
};

use crate::chat::{ChatClient, ChatMessage};
use crate::prompts;
use crate::salvage;
use crate::tokens::TokenTracker;

/// 변화가 없을 때의 요약 문구
const NO_CHANGE_SUMMARY: &str = "화면 텍스트 변화 없음";

/// 검증 응답을 해석하지 못했을 때의 사유
const UNPARSEABLE_VERDICT: &str = "응답 파싱 실패";

/// 채팅 API 위의 판단 서비스
pub struct LlmDecisionService {
    client: Arc<dyn ChatClient>,
    tokens: Arc<TokenTracker>,
}

impl LlmDecisionService {
    pub fn new(client: Arc<dyn ChatClient>, tokens: Arc<TokenTracker>) -> Self {
        Self { client, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenTracker> {
        &self.tokens
    }

    /// 요청 한 번 (토큰 기록 포함)
    async fn ask(&self, request: &'static str, messages: Vec<ChatMessage>) -> Result<String, CoreError> {
        self.tokens
            .record(messages.iter().map(|m| m.content.as_str()));

        let response = self.client.complete(&messages).await?;
        let total = self.tokens.record([response.as_str()]);

        debug!(
            request,
            model = self.client.model(),
            response_len = response.len(),
            total_tokens = total,
            "판단 서비스 응답 수신"
        );
        Ok(response)
    }
}

#[async_trait]
impl DecisionService for LlmDecisionService {
    async fn decompose_goal(&self, goal: &str) -> Result<Vec<SubTask>, CoreError> {
        let response = self.ask("decompose", prompts::decompose(goal)).await?;
        match salvage::parse_subtasks(&response) {
            Some(subtasks) => Ok(subtasks),
            None => {
                warn!("목표 분해 응답 해석 실패, 목표 전체를 단일 서브태스크로 사용");
                Ok(vec![SubTask::new(1, goal)])
            }
        }
    }

    async fn summarize_delta(&self, delta: &OcrDelta) -> Result<String, CoreError> {
        if delta.is_empty() {
            return Ok(NO_CHANGE_SUMMARY.to_string());
        }
        let response = self.ask("summarize", prompts::summarize(delta)?).await?;
        Ok(response.trim().to_string())
    }

    async fn next_actions(&self, context: &ActionContext) -> Result<Vec<ActionSpec>, CoreError> {
        let response = self
            .ask("next_actions", prompts::next_actions(context)?)
            .await?;
        match salvage::parse_actions(&response) {
            Some(actions) => Ok(actions),
            None => {
                warn!(
                    iteration = context.iteration,
                    "액션 응답 해석 실패, 1초 대기 액션으로 대체"
                );
                Ok(vec![ActionSpec::new(
                    1,
                    ActionKind::Nop {
                        duration: Duration::from_secs(1),
                    },
                )])
            }
        }
    }

    async fn verify_goal(&self, context: &VerificationContext) -> Result<Verdict, CoreError> {
        let response = self.ask("verify", prompts::verify(context)?).await?;
        match salvage::parse_verdict(&response) {
            Some(verdict) => Ok(verdict),
            None => {
                warn!(iteration = context.iteration, "검증 응답 해석 실패, 미달성 처리");
                Ok(Verdict {
                    achieved: false,
                    reason: UNPARSEABLE_VERDICT.to_string(),
                    next_prompt: String::new(),
                })
            }
        }
    }
}
