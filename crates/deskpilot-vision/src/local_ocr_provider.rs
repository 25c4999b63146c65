//! 로컬 OCR 제공자: Tesseract 래퍼.
//!
//! `OcrExtractor`를 `OcrProvider` 트레이트로 래핑한다.
//! `ocr` feature가 꺼져 있거나 설정에서 비활성화되면 항상 빈 결과를 돌려준다.

use std::path::PathBuf;

use async_trait::async_trait;

use deskpilot_core::config::VisionConfig;
use deskpilot_core::error::CoreError;
use deskpilot_core::models::frame::Frame;
use deskpilot_core::models::ocr::OcrRegion;
use deskpilot_core::ports::ocr_provider::OcrProvider;

/// 로컬 OCR 제공자 (Tesseract 기반)
pub struct LocalOcrProvider {
    #[cfg_attr(not(feature = "ocr"), allow(dead_code))]
    tessdata_path: Option<PathBuf>,
    enabled: bool,
}

impl LocalOcrProvider {
    /// 새 로컬 OCR 제공자 생성
    pub fn new(tessdata_path: Option<PathBuf>) -> Self {
        Self {
            tessdata_path,
            enabled: true,
        }
    }

    /// `ocr_enabled`, `tessdata_path` 설정 반영
    pub fn from_config(config: &VisionConfig) -> Self {
        Self {
            tessdata_path: config.tessdata_path.clone(),
            enabled: config.ocr_enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for LocalOcrProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl OcrProvider for LocalOcrProvider {
    async fn recognize(&self, frame: &Frame) -> Result<Vec<OcrRegion>, CoreError> {
        if !self.enabled {
            return Ok(vec![]);
        }

        #[cfg(feature = "ocr")]
        {
            use crate::ocr::OcrExtractor;

            let image =
                image::RgbaImage::from_raw(frame.width(), frame.height(), frame.as_raw().to_vec())
                    .ok_or_else(|| CoreError::OcrError("프레임 버퍼 크기 불일치".to_string()))?;

            OcrExtractor::new(self.tessdata_path.clone())
                .extract_regions_async(image)
                .await
                .map_err(|e| CoreError::OcrError(format!("OCR 추출 실패: {e}")))
        }

        #[cfg(not(feature = "ocr"))]
        {
            let _ = frame;
            Ok(vec![])
        }
    }

    fn provider_name(&self) -> &str {
        "local-tesseract"
    }
}
