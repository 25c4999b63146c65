//! OCR 제공자 포트.
//!
//! 구현: `deskpilot-vision` crate (Tesseract, `ocr` feature)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::Frame;
use crate::models::ocr::OcrRegion;

/// OCR 제공자
///
/// 호출자는 실패를 빈 결과로 취급한다.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// 프레임에서 단어 단위 텍스트 영역 추출
    async fn recognize(&self, frame: &Frame) -> Result<Vec<OcrRegion>, CoreError>;

    /// 제공자 이름 (로그용)
    fn provider_name(&self) -> &str;
}
