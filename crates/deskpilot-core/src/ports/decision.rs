//! 판단 서비스 포트.
//!
//! 목표 분해, 다음 액션 배치 결정, 목표 달성 검증, OCR 델타 요약의
//! 네 가지 요청을 추상화한다.
//! 구현: `deskpilot-decision` crate (LLM 채팅 API)
//!
//! 구현체는 잘못된 응답을 안전한 기본값으로 대체해야 하며,
//! `Err`는 통신 실패(`CoreError::Network`)에만 사용한다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::action::ActionSpec;
use crate::models::color::ColorCount;
use crate::models::geometry::Point;
use crate::models::ocr::{OcrDelta, OcrRegion};
use crate::models::perception::PerceptionSnapshot;
use crate::models::task::{PromptLog, SubTask};

/// 다음 액션 배치 요청 컨텍스트
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContext {
    /// 태스크 전체 목표
    pub goal: String,
    /// 현재 서브태스크 설명 (사용자 도움 메시지 반영)
    pub subtask: String,
    pub iteration: u32,
    pub perception: PerceptionSnapshot,
    /// 직전 반복 대비 OCR 델타 (2번째 반복부터)
    pub ocr_delta: Option<OcrDelta>,
    /// OCR 델타 자연어 요약
    pub delta_summary: Option<String>,
    /// 직전 반복의 커서 위치
    pub previous_cursor: Option<Point>,
    pub prompt_log: PromptLog,
    /// 직전 반복에서 실행한 액션
    pub previous_actions: Vec<ActionSpec>,
}

/// 목표 달성 검증 요청 컨텍스트
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationContext {
    pub goal: String,
    pub subtask: String,
    pub iteration: u32,
    /// 액션 실행 후 인식 결과
    pub perception: PerceptionSnapshot,
    /// 액션 실행 전 대표 색상
    pub colors_before: Vec<ColorCount>,
    /// 액션 실행 전 커서 위치
    pub cursor_before: Option<Point>,
    /// 실행 전후 OCR 델타
    pub ocr_delta: OcrDelta,
    pub delta_summary: Option<String>,
    /// 커서 주변 가로 띠의 OCR
    pub ocr_near_cursor: Vec<OcrRegion>,
    /// 이번 반복에서 실행한 액션
    pub executed_actions: Vec<ActionSpec>,
    pub prompt_log: PromptLog,
}

/// 검증 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "isGoalAchieved", default)]
    pub achieved: bool,
    #[serde(rename = "description", default)]
    pub reason: String,
    #[serde(rename = "newPrompt", default)]
    pub next_prompt: String,
}

/// 판단 서비스
#[async_trait]
pub trait DecisionService: Send + Sync {
    /// 목표를 순서 있는 서브태스크로 분해 (항상 1개 이상)
    async fn decompose_goal(&self, goal: &str) -> Result<Vec<SubTask>, CoreError>;

    /// OCR 델타를 자연어로 요약
    async fn summarize_delta(&self, delta: &OcrDelta) -> Result<String, CoreError>;

    /// 다음 액션 배치 결정
    async fn next_actions(&self, context: &ActionContext) -> Result<Vec<ActionSpec>, CoreError>;

    /// 서브태스크 달성 여부 판단
    async fn verify_goal(&self, context: &VerificationContext) -> Result<Verdict, CoreError>;
}
