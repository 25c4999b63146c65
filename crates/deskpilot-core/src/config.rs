//! 애플리케이션 설정 구조체.
//!
//! 인식 파이프라인 임계값, 태스크 루프 타이밍, 판단 서비스 엔드포인트,
//! 입력 드라이버 선택을 정의한다. `ConfigManager`가 JSON 파일로 저장/로드한다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 비전(인식 파이프라인) 설정
    #[serde(default)]
    pub vision: VisionConfig,
    /// 태스크 오케스트레이터 설정
    #[serde(default)]
    pub agent: AgentConfig,
    /// 판단 서비스 설정
    #[serde(default)]
    pub decision: DecisionConfig,
    /// 입력 주입 설정
    #[serde(default)]
    pub input: InputConfig,
}

// ============================================================
// 비전 설정
// ============================================================

/// 인식 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// 판단 서비스에 보고할 대표 색상 개수
    #[serde(default = "default_report_colors")]
    pub report_colors: usize,
    /// 1차(그레이스케일) 영역 검출에 사용할 상위 색상 개수
    #[serde(default = "default_region_colors")]
    pub region_colors: usize,
    /// 느슨한 마스크의 채널 허용 오차
    #[serde(default = "default_loose_drift")]
    pub loose_drift: u8,
    /// 컴포넌트 순도 하한 (%)
    #[serde(default = "default_min_purity")]
    pub min_purity: f64,
    /// 1차 패스 최소 높이 (글리프 단위)
    #[serde(default = "default_glyph_min_height")]
    pub glyph_min_height: i32,
    /// 1차 패스 최소 너비
    #[serde(default = "default_glyph_min_width")]
    pub glyph_min_width: i32,
    /// 2차(이진화) 패스 최소 높이 (패널 단위)
    #[serde(default = "default_panel_min")]
    pub panel_min_height: i32,
    /// 2차 패스 최소 너비
    #[serde(default = "default_panel_min")]
    pub panel_min_width: i32,
    /// 이진화 임계값 (미만 → 0, 이상 → 255)
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,
    /// OCR 스냅샷 직렬화 길이가 이 값을 넘으면 근접 텍스트 병합 수행
    #[serde(default = "default_merge_trigger_chars")]
    pub merge_trigger_chars: usize,
    /// 병합 시 수평 근접 허용치 (px)
    #[serde(default = "default_merge_h_proximity")]
    pub merge_h_proximity: i32,
    /// 병합 시 수직 근접 허용치 (px)
    #[serde(default = "default_merge_v_proximity")]
    pub merge_v_proximity: i32,
    /// 로컬 OCR 활성화 (`ocr` feature 필요)
    #[serde(default)]
    pub ocr_enabled: bool,
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    #[serde(default)]
    pub tessdata_path: Option<PathBuf>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            report_colors: default_report_colors(),
            region_colors: default_region_colors(),
            loose_drift: default_loose_drift(),
            min_purity: default_min_purity(),
            glyph_min_height: default_glyph_min_height(),
            glyph_min_width: default_glyph_min_width(),
            panel_min_height: default_panel_min(),
            panel_min_width: default_panel_min(),
            binarize_threshold: default_binarize_threshold(),
            merge_trigger_chars: default_merge_trigger_chars(),
            merge_h_proximity: default_merge_h_proximity(),
            merge_v_proximity: default_merge_v_proximity(),
            ocr_enabled: false,
            tessdata_path: None,
        }
    }
}

// ============================================================
// 에이전트 설정
// ============================================================

/// 반복 상한 도달 시 처리 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IterationCapPolicy {
    /// 경고를 남기고 다음 서브태스크로 진행
    #[default]
    Continue,
    /// 태스크를 `broken`으로 종료
    Fail,
}

/// 태스크 오케스트레이터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// 서브태스크당 최대 반복 횟수
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// 검증 실패 후 다음 반복까지 대기 (ms)
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,
    /// 각 액션 실행 전 대기 (ms)
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,
    /// stateUpdate 액션의 화면 안정화 대기 (ms)
    #[serde(default = "default_state_update_settle_ms")]
    pub state_update_settle_ms: u64,
    /// 커서 주변 OCR 띠의 상하 폭 (px)
    #[serde(default = "default_cursor_band_px")]
    pub cursor_band_px: i32,
    /// 반복 상한 도달 시 정책
    #[serde(default)]
    pub on_iteration_cap: IterationCapPolicy,
    /// 이벤트 브로드캐스트 채널 용량
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            iteration_delay_ms: default_iteration_delay_ms(),
            action_delay_ms: default_action_delay_ms(),
            state_update_settle_ms: default_state_update_settle_ms(),
            cursor_band_px: default_cursor_band_px(),
            on_iteration_cap: IterationCapPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl AgentConfig {
    /// 반복 간 대기를 Duration으로 반환
    pub fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }

    /// 액션 간 대기를 Duration으로 반환
    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    /// stateUpdate 안정화 대기를 Duration으로 반환
    pub fn state_update_settle(&self) -> Duration {
        Duration::from_millis(self.state_update_settle_ms)
    }
}

// ============================================================
// 판단 서비스 설정
// ============================================================

/// 판단 서비스 API 형식: 요청/응답 형식 및 인증 헤더 결정에 사용
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderType {
    /// Anthropic Messages API: `x-api-key` 헤더 + `/v1/messages` 형식
    Anthropic,
    /// OpenAI 호환 API: `Authorization: Bearer` 헤더 + `/v1/chat/completions` 형식
    #[default]
    OpenAi,
    /// 기타 제공자: Bearer 인증, 범용 응답 파싱
    Generic,
}

/// 판단 서비스 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// API 형식
    #[serde(default)]
    pub provider_type: AiProviderType,
    /// API URL (예: "https://api.example.com/v1/chat/completions")
    #[serde(default = "default_decision_endpoint")]
    pub endpoint: String,
    /// API 키 (로컬 config.json 또는 환경변수)
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름
    #[serde(default = "default_decision_model")]
    pub model: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
    /// 응답 최대 토큰
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 샘플링 온도
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            provider_type: AiProviderType::default(),
            endpoint: default_decision_endpoint(),
            api_key: String::new(),
            model: default_decision_model(),
            timeout_secs: default_api_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl DecisionConfig {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================
// 입력 설정
// ============================================================

/// 입력 드라이버 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputDriverKind {
    /// 로그만 남기는 드라이버 (기본값, dry-run)
    #[default]
    Noop,
    /// enigo 기반 실제 입력 주입 (`enigo` feature 필요)
    Enigo,
}

/// 입력 주입 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// 사용할 드라이버
    #[serde(default)]
    pub driver: InputDriverKind,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            vision: VisionConfig::default(),
            agent: AgentConfig::default(),
            decision: DecisionConfig::default(),
            input: InputConfig::default(),
        }
    }

    /// 하한 미만 값을 보정한다. 바뀐 값이 있으면 `true`.
    ///
    /// `max_iterations`가 0이면 모든 서브태스크가 한 번도 돌지 않고 상한에 걸린다.
    pub fn clamp_limits(&mut self) -> bool {
        let mut changed = false;
        if self.agent.max_iterations == 0 {
            self.agent.max_iterations = 1;
            changed = true;
        }
        if self.agent.event_capacity == 0 {
            self.agent.event_capacity = 1;
            changed = true;
        }
        changed
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_report_colors() -> usize {
    10
}
fn default_region_colors() -> usize {
    40
}
fn default_loose_drift() -> u8 {
    80
}
fn default_min_purity() -> f64 {
    80.0
}
fn default_glyph_min_height() -> i32 {
    6
}
fn default_glyph_min_width() -> i32 {
    9
}
fn default_panel_min() -> i32 {
    15
}
fn default_binarize_threshold() -> u8 {
    98
}
fn default_merge_trigger_chars() -> usize {
    10_000
}
fn default_merge_h_proximity() -> i32 {
    20
}
fn default_merge_v_proximity() -> i32 {
    40
}
fn default_max_iterations() -> u32 {
    40
}
fn default_iteration_delay_ms() -> u64 {
    1_000
}
fn default_action_delay_ms() -> u64 {
    100
}
fn default_state_update_settle_ms() -> u64 {
    1_000
}
fn default_cursor_band_px() -> i32 {
    23
}
fn default_event_capacity() -> usize {
    256
}
fn default_decision_endpoint() -> String {
    "http://localhost:11434/v1/chat/completions".to_string()
}
fn default_decision_model() -> String {
    "deepseek-chat".to_string()
}
fn default_api_timeout_secs() -> u64 {
    300
}
fn default_temperature() -> f32 {
    0.5
}
fn default_max_tokens() -> u32 {
    4_096
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.agent.max_iterations, 40);
        assert_eq!(config.agent.on_iteration_cap, IterationCapPolicy::Continue);
        assert_eq!(config.vision.loose_drift, 80);
        assert_eq!(config.input.driver, InputDriverKind::Noop);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let json = r#"{"agent": {"max_iterations": 5, "on_iteration_cap": "fail"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.on_iteration_cap, IterationCapPolicy::Fail);
        assert_eq!(config.agent.action_delay(), Duration::from_millis(100));
    }

    #[test]
    fn provider_type_lowercase() {
        let json = r#"{"decision": {"provider_type": "anthropic"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.decision.provider_type, AiProviderType::Anthropic);
        assert_eq!(config.decision.request_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn clamp_limits_raises_zero_values() {
        let mut config = AppConfig::default_config();
        assert!(!config.clamp_limits());

        config.agent.max_iterations = 0;
        assert!(config.clamp_limits());
        assert_eq!(config.agent.max_iterations, 1);
        assert_eq!(config.agent.event_capacity, 256);
    }
}
