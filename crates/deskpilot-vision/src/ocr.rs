//! OCR 텍스트 추출 모듈.
//!
//! `leptess` 기반 Tesseract OCR 래퍼. 엔진 호출은 `ocr` feature flag 활성화 시에만
//! 빌드되며, Tesseract TSV 출력 파서는 항상 제공된다.
//!
//! - Async wrapper: spawn_blocking으로 런타임 스레드 블로킹 제거
//! - 워드 단위 결과: TSV level 5 행만 영역으로 변환

use deskpilot_core::models::geometry::Rect;
use deskpilot_core::models::ocr::OcrRegion;
use thiserror::Error;

/// OCR 에러 타입
#[derive(Debug, Error)]
pub enum OcrError {
    /// Tesseract 초기화 실패
    #[error("OCR 초기화 실패: {0}")]
    Init(String),

    /// 이미지 설정 실패
    #[error("OCR 이미지 설정 실패: {0}")]
    ImageSetup(String),

    /// 텍스트 추출 실패
    #[error("OCR 텍스트 추출 실패: {0}")]
    Extraction(String),

    /// 빈 이미지 입력
    #[error("빈 이미지: 너비 또는 높이가 0")]
    EmptyImage,

    /// 비동기 작업 실패
    #[error("OCR 비동기 작업 실패: {0}")]
    Async(String),
}

/// TSV의 워드 레벨
const WORD_LEVEL: &str = "5";
/// TSV 열 수 (level ~ text)
const TSV_COLUMNS: usize = 12;

/// Tesseract TSV 출력에서 워드 영역을 추출한다.
///
/// 헤더 행, 워드가 아닌 행, 신뢰도가 음수인 행, 빈 텍스트는 건너뛴다.
pub fn parse_tsv(tsv: &str) -> Vec<OcrRegion> {
    tsv.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.splitn(TSV_COLUMNS, '\t').collect();
            if fields.len() < TSV_COLUMNS || fields[0] != WORD_LEVEL {
                return None;
            }
            let number = |i: usize| fields[i].trim().parse::<i32>().ok();
            let (left, top, width, height) = (number(6)?, number(7)?, number(8)?, number(9)?);
            let confidence: f32 = fields[10].trim().parse().ok()?;
            let text = fields[11].trim();
            if confidence < 0.0 || text.is_empty() {
                return None;
            }
            Some(OcrRegion::new(
                text,
                Rect::new(left, top, left + width, top + height),
                confidence,
            ))
        })
        .collect()
}

#[cfg(feature = "ocr")]
pub use engine::OcrExtractor;

#[cfg(feature = "ocr")]
mod engine {
    use std::io::Cursor;
    use std::path::PathBuf;

    use deskpilot_core::models::ocr::OcrRegion;
    use image::{ImageFormat, RgbaImage};
    use tracing::debug;

    use super::{parse_tsv, OcrError};

    /// OCR 텍스트 추출기
    pub struct OcrExtractor {
        /// Tesseract 데이터 경로 (None이면 시스템 기본값)
        tessdata_path: Option<PathBuf>,
        language: String,
    }

    impl OcrExtractor {
        /// 새 OCR 추출기 생성
        pub fn new(tessdata_path: Option<PathBuf>) -> Self {
            Self {
                tessdata_path,
                language: "eng".to_string(),
            }
        }

        /// 인식 언어 설정 (예: "eng+kor")
        pub fn with_language(mut self, language: impl Into<String>) -> Self {
            self.language = language.into();
            self
        }

        /// tessdata 경로 반환
        pub fn tessdata_path(&self) -> Option<&PathBuf> {
            self.tessdata_path.as_ref()
        }

        /// 워드 단위 영역 추출 (동기)
        pub fn extract_regions(&self, image: &RgbaImage) -> Result<Vec<OcrRegion>, OcrError> {
            let tessdata = self
                .tessdata_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string());
            run(tessdata.as_deref(), &self.language, image)
        }

        /// 워드 단위 영역 추출 (비동기)
        pub async fn extract_regions_async(
            &self,
            image: RgbaImage,
        ) -> Result<Vec<OcrRegion>, OcrError> {
            let tessdata = self
                .tessdata_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string());
            let language = self.language.clone();

            tokio::task::spawn_blocking(move || run(tessdata.as_deref(), &language, &image))
                .await
                .map_err(|e| OcrError::Async(format!("작업 조인 실패: {e}")))?
        }
    }

    fn run(
        tessdata: Option<&str>,
        language: &str,
        image: &RgbaImage,
    ) -> Result<Vec<OcrRegion>, OcrError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OcrError::EmptyImage);
        }

        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| OcrError::ImageSetup(format!("PNG 인코딩 실패: {e}")))?;

        let mut lt =
            leptess::LepTess::new(tessdata, language).map_err(|e| OcrError::Init(format!("{e}")))?;
        lt.set_image_from_mem(&encoded)
            .map_err(|e| OcrError::ImageSetup(format!("{e}")))?;

        let tsv = lt
            .get_tsv_text(0)
            .map_err(|e| OcrError::Extraction(format!("{e}")))?;
        let regions = parse_tsv(&tsv);
        debug!(words = regions.len(), "OCR 완료");
        Ok(regions)
    }
}
