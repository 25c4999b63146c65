//! 캡처 프레임 모델.
//!
//! 스크린 캡처 포트가 반환하는 RGBA 픽셀 버퍼. 반복(iteration) 단위로만 사용되며
//! 저장되지 않는다.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::geometry::Point;

/// RGBA8 프레임 (행 우선, 픽셀당 4바이트)
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// 캡처 시점의 커서 위치
    pub cursor: Option<Point>,
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// 픽셀 버퍼 길이를 검증하여 생성
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CoreError::Validation {
                field: "pixels".to_string(),
                message: format!(
                    "{}x{} 프레임은 {}바이트여야 하지만 {}바이트",
                    width,
                    height,
                    expected,
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            cursor: None,
            captured_at: Utc::now(),
        })
    }

    /// 커서 위치 지정
    pub fn with_cursor(mut self, cursor: Option<Point>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 원시 RGBA 바이트
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// 소유권 이전
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }
}
