//! 프레임 분석기.
//!
//! 캡처된 프레임 하나를 인식 스냅샷으로 변환한다.
//! 색상 집계, 2단계 영역 검출, OCR 병합, 창 장식 검출을 순서대로 묶는다.

use deskpilot_core::config::VisionConfig;
use deskpilot_core::error::CoreError;
use deskpilot_core::models::color::ColorCount;
use deskpilot_core::models::frame::Frame;
use deskpilot_core::models::geometry::BoundingBox;
use deskpilot_core::models::ocr::OcrRegion;
use deskpilot_core::models::perception::PerceptionSnapshot;
use deskpilot_core::models::window::WindowDescriptor;
use image::{GrayImage, RgbaImage};
use tracing::{debug, warn};

use crate::palette::{dominant_colors, to_grayscale};
use crate::regions::RegionDetector;
use crate::text_delta::merge_close_text;
use crate::window_chrome::WindowChromeDetector;

/// OCR 없이 얻는 프레임 분석 결과
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub colors: Vec<ColorCount>,
    pub gray: GrayImage,
    pub boxes: Vec<BoundingBox>,
}

/// 프레임 분석기
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    config: VisionConfig,
    regions: RegionDetector,
    chrome: WindowChromeDetector,
}

impl FrameAnalyzer {
    pub fn new(config: VisionConfig) -> Self {
        let regions = RegionDetector::new(config.loose_drift, config.min_purity);
        Self {
            config,
            regions,
            chrome: WindowChromeDetector::new(),
        }
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// 대표 색상, 그레이스케일, 영역 박스
    pub fn analyze(&self, frame: &Frame) -> Result<FrameAnalysis, CoreError> {
        let rgba = RgbaImage::from_raw(frame.width(), frame.height(), frame.as_raw().to_vec())
            .ok_or_else(|| CoreError::Validation {
                field: "frame".to_string(),
                message: "RGBA 버퍼 크기 불일치".to_string(),
            })?;

        let colors = dominant_colors(&rgba, self.config.report_colors);
        let gray = to_grayscale(&rgba);
        let boxes = self.regions.detect_two_pass(&gray, &self.config);

        debug!(
            width = frame.width(),
            height = frame.height(),
            colors = colors.len(),
            boxes = boxes.len(),
            "프레임 분석 완료"
        );

        Ok(FrameAnalysis {
            colors,
            gray,
            boxes,
        })
    }

    /// 직렬화 길이가 임계값을 넘으면 근접 텍스트를 병합한다
    pub fn prepare_ocr(&self, ocr: Vec<OcrRegion>) -> Vec<OcrRegion> {
        let serialized_len = match serde_json::to_string(&ocr) {
            Ok(json) => json.len(),
            Err(e) => {
                warn!("OCR 직렬화 실패, 병합 생략: {e}");
                return ocr;
            }
        };
        if serialized_len <= self.config.merge_trigger_chars {
            return ocr;
        }

        let merged = merge_close_text(
            &ocr,
            self.config.merge_h_proximity,
            self.config.merge_v_proximity,
        );
        debug!(
            before = ocr.len(),
            after = merged.len(),
            serialized_len,
            "OCR 근접 텍스트 병합"
        );
        merged
    }

    /// OCR 영역마다 창 장식 검출을 시도한다. 실패한 후보는 버린다.
    pub fn detect_windows(&self, gray: &GrayImage, ocr: &[OcrRegion]) -> Vec<WindowDescriptor> {
        ocr.iter()
            .filter_map(|region| {
                match self.chrome.detect(gray, region.bounding_box, &region.text) {
                    Ok(window) => Some(window),
                    Err(miss) => {
                        debug!(text = %region.text, phase = ?miss.phase(), "창 후보 제외: {miss}");
                        None
                    }
                }
            })
            .collect()
    }

    /// 프레임과 OCR 결과로 전체 스냅샷 생성 (블로킹, CPU 집약)
    pub fn perceive(&self, frame: &Frame, ocr: Vec<OcrRegion>) -> Result<PerceptionSnapshot, CoreError> {
        let analysis = self.analyze(frame)?;
        let windows = self.detect_windows(&analysis.gray, &ocr);
        let ocr = self.prepare_ocr(ocr);

        Ok(PerceptionSnapshot {
            screen: (frame.width(), frame.height()),
            colors: analysis.colors,
            ocr,
            windows,
            boxes: analysis.boxes,
            cursor: frame.cursor,
        })
    }
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::new(VisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::models::geometry::{Point, Rect};

    fn frame_with_square() -> Frame {
        let image = RgbaImage::from_fn(80, 60, |x, y| {
            if (20..50).contains(&x) && (10..40).contains(&y) {
                image::Rgba([10, 10, 10, 255])
            } else {
                image::Rgba([250, 250, 250, 255])
            }
        });
        Frame::new(80, 60, image.into_raw()).unwrap()
    }

    #[test]
    fn perceive_fills_snapshot() {
        let frame = frame_with_square().with_cursor(Some(Point::new(5, 5)));
        let snapshot = FrameAnalyzer::default().perceive(&frame, Vec::new()).unwrap();

        assert_eq!(snapshot.screen, (80, 60));
        assert_eq!(snapshot.colors.len(), 2);
        assert_eq!(snapshot.cursor, Some(Point::new(5, 5)));
        assert!(snapshot
            .boxes
            .iter()
            .any(|b| (b.x1, b.y1, b.x2, b.y2) == (20, 10, 49, 39)));
        assert!(snapshot.windows.is_empty());
    }

    #[test]
    fn small_ocr_is_not_merged() {
        let ocr = vec![
            OcrRegion::new("a", Rect::new(0, 0, 10, 10), 90.0),
            OcrRegion::new("b", Rect::new(2, 2, 12, 12), 90.0),
        ];
        let prepared = FrameAnalyzer::default().prepare_ocr(ocr.clone());
        assert_eq!(prepared, ocr);
    }

    #[test]
    fn large_ocr_is_merged() {
        let config = VisionConfig {
            merge_trigger_chars: 10,
            ..VisionConfig::default()
        };
        let ocr = vec![
            OcrRegion::new("a", Rect::new(0, 0, 10, 10), 90.0),
            OcrRegion::new("b", Rect::new(2, 2, 12, 12), 90.0),
        ];
        let prepared = FrameAnalyzer::new(config).prepare_ocr(ocr);
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].text, "a b");
    }

    #[test]
    fn ocr_without_chrome_yields_no_windows() {
        let frame = frame_with_square();
        let analyzer = FrameAnalyzer::default();
        let analysis = analyzer.analyze(&frame).unwrap();
        let ocr = vec![OcrRegion::new("x", Rect::new(22, 12, 30, 20), 90.0)];
        assert!(analyzer.detect_windows(&analysis.gray, &ocr).is_empty());
    }
}
