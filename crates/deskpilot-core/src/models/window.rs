//! 창 장식(window chrome) 인식 결과 모델.
//!
//! 검출이 성공한 경우에만 생성된다. 매 반복마다 다시 계산되며 저장되지 않는다.

use serde::{Deserialize, Serialize};

use crate::models::geometry::Rect;

/// 제목 표시줄의 4개 제어 버튼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowButtons {
    pub roll_up: Rect,
    pub minimize: Rect,
    pub maximize: Rect,
    pub close: Rect,
}

/// 인식된 창
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    /// 제목 텍스트 (OCR)
    pub title: String,
    /// 창 외곽 (헤더 왼쪽/위 ~ 테두리 오른쪽/검출된 바닥)
    pub bounding_box: Rect,
    /// 제목 표시줄 영역
    pub header: Rect,
    pub buttons: WindowButtons,
}
