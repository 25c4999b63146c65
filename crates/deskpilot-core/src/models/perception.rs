//! 인식 스냅샷 모델.
//!
//! 한 번의 캡처에서 얻은 대표 색상, OCR, 창, 바운딩 박스, 커서 위치를 묶는다.

use serde::{Deserialize, Serialize};

use crate::models::color::ColorCount;
use crate::models::geometry::{BoundingBox, Point};
use crate::models::ocr::OcrRegion;
use crate::models::window::WindowDescriptor;

/// 한 프레임의 인식 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerceptionSnapshot {
    /// 프레임 크기 (width, height)
    pub screen: (u32, u32),
    pub colors: Vec<ColorCount>,
    pub ocr: Vec<OcrRegion>,
    pub windows: Vec<WindowDescriptor>,
    pub boxes: Vec<BoundingBox>,
    pub cursor: Option<Point>,
}

impl PerceptionSnapshot {
    /// 커서 주변 가로 띠(`cursor.y ± band`)와 겹치는 OCR 영역
    pub fn ocr_near_cursor(&self, band: i32) -> Vec<OcrRegion> {
        let Some(cursor) = self.cursor else {
            return Vec::new();
        };
        let top = cursor.y - band;
        let bottom = cursor.y + band;
        self.ocr
            .iter()
            .filter(|region| region.bounding_box.overlaps_rows(top, bottom))
            .cloned()
            .collect()
    }
}
