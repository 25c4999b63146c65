//! 액션 모델.
//!
//! 판단 서비스가 반환하는 액션 배치의 한 항목. 와이어 형식은 문자열 태그(`action`)와
//! 선택 필드의 평면 JSON이며, 내부에서는 [`ActionKind`] 태그 enum으로 다룬다.
//! 알 수 없는 태그나 필수 필드가 빠진 항목은 [`ActionKind::Unknown`]이 된다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 액션 종류
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    /// 절대 좌표로 포인터 이동
    MouseMove { x: i32, y: i32 },
    /// 현재 위치 기준 상대 이동
    MouseMoveRelative { dx: i32, dy: i32 },
    MouseClickLeft,
    MouseClickLeftDouble,
    MouseClickRight,
    /// 왼쪽 버튼을 누른 채 목표 좌표로 끌기
    DragSmooth { x: i32, y: i32 },
    /// 세로 스크롤 (양수 = 아래)
    ScrollSmooth { amount: i32 },
    /// 키 또는 `ctrl+alt+t` 형식 조합 입력
    KeyTap { key: String },
    KeyDown { key: String },
    KeyUp { key: String },
    /// 문자열 타이핑
    PrintString { text: String },
    /// 지정 시간 대기
    Nop { duration: Duration },
    /// 화면 안정화 대기 후 배치 중단
    StateUpdate,
    /// 남은 배치 중단
    StopIteration,
    /// 앞서 실행된 `[first, last]` 시퀀스 범위를 `times`번 재실행
    Repeat { first: u32, last: u32, times: u32 },
    /// 알 수 없거나 불완전한 액션: 경고 후 무시
    Unknown { tag: String },
}

/// 대기 액션 상한 (초)
pub const MAX_NOP_SECS: f64 = 600.0;

/// 와이어 태그 목록 (판단 서비스 프롬프트와 공유)
pub const ACTION_TAGS: &[&str] = &[
    "mouseMove",
    "mouseMoveRelative",
    "mouseClickLeft",
    "mouseClickLeftDouble",
    "mouseClickRight",
    "dragSmooth",
    "scrollSmooth",
    "keyTap",
    "keyDown",
    "keyUp",
    "printString",
    "nop",
    "stateUpdate",
    "stopIteration",
    "repeat",
];

impl ActionKind {
    /// 와이어 태그
    pub fn tag(&self) -> &str {
        match self {
            ActionKind::MouseMove { .. } => "mouseMove",
            ActionKind::MouseMoveRelative { .. } => "mouseMoveRelative",
            ActionKind::MouseClickLeft => "mouseClickLeft",
            ActionKind::MouseClickLeftDouble => "mouseClickLeftDouble",
            ActionKind::MouseClickRight => "mouseClickRight",
            ActionKind::DragSmooth { .. } => "dragSmooth",
            ActionKind::ScrollSmooth { .. } => "scrollSmooth",
            ActionKind::KeyTap { .. } => "keyTap",
            ActionKind::KeyDown { .. } => "keyDown",
            ActionKind::KeyUp { .. } => "keyUp",
            ActionKind::PrintString { .. } => "printString",
            ActionKind::Nop { .. } => "nop",
            ActionKind::StateUpdate => "stateUpdate",
            ActionKind::StopIteration => "stopIteration",
            ActionKind::Repeat { .. } => "repeat",
            ActionKind::Unknown { tag } => tag.as_str(),
        }
    }

    /// 배치 흐름 제어용 액션 여부 (repeat 재실행 대상에서 제외된다)
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            ActionKind::StateUpdate | ActionKind::StopIteration | ActionKind::Repeat { .. }
        )
    }
}

/// 배치 내 액션 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireAction", into = "WireAction")]
pub struct ActionSpec {
    /// 배치 내 실행 순서 키 (오름차순, 연속일 필요 없음)
    pub sequence_id: u32,
    pub kind: ActionKind,
    /// 판단 서비스가 붙인 설명
    pub description: Option<String>,
}

impl ActionSpec {
    pub fn new(sequence_id: u32, kind: ActionKind) -> Self {
        Self {
            sequence_id,
            kind,
            description: None,
        }
    }
}

// ============================================================
// 와이어 형식
// ============================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct WireCoordinates {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAction {
    #[serde(rename = "actionSequenceID", default)]
    action_sequence_id: u32,
    #[serde(default)]
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<WireCoordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_tap_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actions_range: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repeat_times: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl WireAction {
    fn point(&self) -> Option<(i32, i32)> {
        self.coordinates
            .map(|c| (c.x.round() as i32, c.y.round() as i32))
    }

    fn non_empty(value: &Option<String>) -> Option<String> {
        value.as_ref().filter(|s| !s.is_empty()).cloned()
    }

    fn kind(&self) -> Option<ActionKind> {
        let kind = match self.action.as_str() {
            "mouseMove" => {
                let (x, y) = self.point()?;
                ActionKind::MouseMove { x, y }
            }
            "mouseMoveRelative" => {
                let (dx, dy) = self.point()?;
                ActionKind::MouseMoveRelative { dx, dy }
            }
            "mouseClickLeft" => ActionKind::MouseClickLeft,
            "mouseClickLeftDouble" => ActionKind::MouseClickLeftDouble,
            "mouseClickRight" => ActionKind::MouseClickRight,
            "dragSmooth" => {
                let (x, y) = self.point()?;
                ActionKind::DragSmooth { x, y }
            }
            "scrollSmooth" => ActionKind::ScrollSmooth {
                amount: self.point()?.1,
            },
            "keyTap" => ActionKind::KeyTap {
                key: Self::non_empty(&self.key_tap_string)
                    .or_else(|| Self::non_empty(&self.key_string))?,
            },
            "keyDown" => ActionKind::KeyDown {
                key: Self::non_empty(&self.key_string)?,
            },
            "keyUp" => ActionKind::KeyUp {
                key: Self::non_empty(&self.key_string)?,
            },
            "printString" => ActionKind::PrintString {
                text: self.input_string.clone()?,
            },
            "nop" => {
                let secs = self.duration.unwrap_or(0.0);
                let secs = if secs.is_finite() { secs.clamp(0.0, MAX_NOP_SECS) } else { 0.0 };
                ActionKind::Nop {
                    duration: Duration::from_secs_f64(secs),
                }
            }
            "stateUpdate" => ActionKind::StateUpdate,
            "stopIteration" => ActionKind::StopIteration,
            "repeat" => {
                let range = self.actions_range.as_ref()?;
                let (first, last) = match range.as_slice() {
                    [first, last] => (*first, *last),
                    [single] => (*single, *single),
                    _ => return None,
                };
                ActionKind::Repeat {
                    first,
                    last,
                    times: self.repeat_times.unwrap_or(1),
                }
            }
            _ => return None,
        };
        Some(kind)
    }
}

impl From<WireAction> for ActionSpec {
    fn from(wire: WireAction) -> Self {
        let kind = wire.kind().unwrap_or_else(|| ActionKind::Unknown {
            tag: wire.action.clone(),
        });
        ActionSpec {
            sequence_id: wire.action_sequence_id,
            kind,
            description: wire.description,
        }
    }
}

impl From<ActionSpec> for WireAction {
    fn from(spec: ActionSpec) -> Self {
        let mut wire = WireAction {
            action_sequence_id: spec.sequence_id,
            action: spec.kind.tag().to_string(),
            description: spec.description,
            ..Default::default()
        };
        let coords = |x: i32, y: i32| {
            Some(WireCoordinates {
                x: f64::from(x),
                y: f64::from(y),
            })
        };
        match spec.kind {
            ActionKind::MouseMove { x, y } | ActionKind::DragSmooth { x, y } => {
                wire.coordinates = coords(x, y);
            }
            ActionKind::MouseMoveRelative { dx, dy } => wire.coordinates = coords(dx, dy),
            ActionKind::ScrollSmooth { amount } => wire.coordinates = coords(0, amount),
            ActionKind::KeyTap { key } => wire.key_tap_string = Some(key),
            ActionKind::KeyDown { key } | ActionKind::KeyUp { key } => {
                wire.key_string = Some(key)
            }
            ActionKind::PrintString { text } => wire.input_string = Some(text),
            ActionKind::Nop { duration } => wire.duration = Some(duration.as_secs_f64()),
            ActionKind::Repeat { first, last, times } => {
                wire.actions_range = Some(vec![first, last]);
                wire.repeat_times = Some(times);
            }
            ActionKind::MouseClickLeft
            | ActionKind::MouseClickLeftDouble
            | ActionKind::MouseClickRight
            | ActionKind::StateUpdate
            | ActionKind::StopIteration
            | ActionKind::Unknown { .. } => {}
        }
        wire
    }
}
