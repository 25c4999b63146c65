//! OCR 결과 및 델타 모델.

use serde::{Deserialize, Serialize};

use crate::models::geometry::Rect;

/// OCR로 인식된 텍스트 영역
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrRegion {
    /// 인식된 텍스트
    pub text: String,
    /// 텍스트 영역
    pub bounding_box: Rect,
    /// 신뢰도 (0.0 ~ 100.0)
    pub confidence: f32,
}

impl OcrRegion {
    /// 신뢰도를 [0, 100]으로 제한하여 생성
    pub fn new(text: impl Into<String>, bounding_box: Rect, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }
}

/// 두 OCR 스냅샷 간 차이
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrDelta {
    /// 새 스냅샷에만 있는 텍스트
    pub added: Vec<OcrRegion>,
    /// 이전 스냅샷에만 있는 텍스트
    pub removed: Vec<OcrRegion>,
    /// 양쪽에 있지만 위치가 바뀐 텍스트 (새 위치)
    pub modified: Vec<OcrRegion>,
}

impl OcrDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}
