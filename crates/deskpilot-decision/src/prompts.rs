//! 판단 서비스 프롬프트 구성.
//!
//! 시스템 프롬프트는 역할과 출력 형식을 고정하고, 사용자 메시지에는 인식 컨텍스트를
//! JSON으로 직렬화해 넣는다. JSON 키와 액션 태그는 영어 와이어 이름을 그대로 쓴다.

use deskpilot_core::error::CoreError;
use deskpilot_core::models::action::ACTION_TAGS;
use deskpilot_core::models::ocr::OcrDelta;
use deskpilot_core::ports::decision::{ActionContext, VerificationContext};

use crate::chat::ChatMessage;

const DECOMPOSE_SYSTEM: &str = r#"당신은 데스크톱 자동화 계획자입니다.
사용자 목표를 화면 조작으로 달성할 수 있는 순서 있는 하위 작업으로 나누세요.
각 하위 작업은 화면에서 확인 가능한 하나의 상태 변화여야 합니다.

응답 형식 (JSON만, 주석 금지):
["첫 번째 하위 작업", "두 번째 하위 작업"]"#;

const SUMMARIZE_SYSTEM: &str = r#"당신은 화면 변화 요약기입니다.
두 화면 사이 OCR 텍스트 변화(added/removed/modified)를 보고 무엇이 바뀌었는지
한두 문장으로 설명하세요. 창이 열리거나 닫힌 흔적, 입력된 텍스트, 메뉴 변화에 주목하세요.
JSON이 아닌 일반 문장으로 답하세요."#;

const VERIFY_SYSTEM: &str = r#"당신은 데스크톱 자동화 검증자입니다.
액션 실행 전후의 인식 결과(OCR, OCR 변화, 창, 색상 분포, 커서 주변 텍스트)를 비교해
현재 하위 작업이 달성되었는지 판단하세요. 화면에서 확인되는 증거가 있을 때만 달성으로 봅니다.
달성되지 않았다면 다음 반복에서 시도할 방향을 newPrompt에 적으세요.

응답 형식 (JSON만, 주석 금지):
{"isGoalAchieved": false, "description": "판단 근거", "newPrompt": "다음 시도 지침"}"#;

/// 액션 생성 시스템 프롬프트
fn action_system() -> String {
    format!(
        r#"당신은 데스크톱을 조작해 작업을 완수하는 에이전트입니다.
입력 데이터(OCR 텍스트, 바운딩 박스, 창, 커서 위치, 이전 액션, OCR 변화)를 먼저 분석한 뒤
현재 하위 작업을 진전시키는 액션 배열을 JSON으로 출력하세요.

규칙:
- 요소와 상호작용하려면 먼저 마우스를 요소의 안쪽 중앙으로 이동하세요.
- 가능하면 단축키를 사용하세요.
- 이전 반복에서 이미 성공한 단계를 이유 없이 반복하지 마세요 (ocrDelta로 확인).
- 같은 액션을 연속 5번 넘게 내지 마세요. 반복이 필요하면 repeat를 쓰세요.
- 하위 작업이 이미 달성되었다면 stopIteration을 내세요.
- 화면이 바뀔 때까지 기다려야 하면 nop(초) 또는 stateUpdate를 쓰세요.

사용 가능한 action: {tags}

필드:
- actionSequenceID: 실행 순서 (1부터)
- coordinates: {{"x": 정수, "y": 정수}} (mouseMove, mouseMoveRelative, dragSmooth, scrollSmooth는 y만 사용, 음수 = 위)
- duration: nop 대기 초
- inputString: printString 입력 문자열
- keyTapString: keyTap 키 또는 조합 (예: "enter", "ctrl+alt+t")
- keyString: keyDown/keyUp 키
- actionsRange: repeat 대상 [첫 ID, 마지막 ID]: repeat보다 앞선 액션만
- repeatTimes: repeat 횟수

응답 형식 (JSON 배열만, 주석 금지):
[{{"actionSequenceID": 1, "action": "mouseMove", "coordinates": {{"x": 555, "y": 777}}}},
 {{"actionSequenceID": 2, "action": "mouseClickLeft"}}]"#,
        tags = ACTION_TAGS.join(", ")
    )
}

/// 목표 분해 요청
pub fn decompose(goal: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(DECOMPOSE_SYSTEM),
        ChatMessage::user(format!("목표: {goal}")),
    ]
}

/// OCR 델타 요약 요청
pub fn summarize(delta: &OcrDelta) -> Result<Vec<ChatMessage>, CoreError> {
    Ok(vec![
        ChatMessage::system(SUMMARIZE_SYSTEM),
        ChatMessage::user(serde_json::to_string(delta)?),
    ])
}

/// 다음 액션 배치 요청
pub fn next_actions(context: &ActionContext) -> Result<Vec<ChatMessage>, CoreError> {
    let payload = serde_json::to_string(context)?;
    Ok(vec![
        ChatMessage::system(action_system()),
        ChatMessage::user(format!(
            "현재 하위 작업: {}\n전체 목표: {}\n반복: {}\n\n입력 데이터:\n{payload}",
            context.subtask, context.goal, context.iteration
        )),
    ])
}

/// 달성 검증 요청
pub fn verify(context: &VerificationContext) -> Result<Vec<ChatMessage>, CoreError> {
    let payload = serde_json::to_string(context)?;
    Ok(vec![
        ChatMessage::system(VERIFY_SYSTEM),
        ChatMessage::user(format!(
            "현재 하위 작업: {}\n전체 목표: {}\n반복: {}\n\n입력 데이터:\n{payload}",
            context.subtask, context.goal, context.iteration
        )),
    ])
}
