//! 스크린 캡처.
//!
//! xcap 기반 주 모니터 캡처. 캡처는 블로킹 호출이므로 spawn_blocking에서 실행한다.

use async_trait::async_trait;
use deskpilot_core::error::CoreError;
use deskpilot_core::models::frame::Frame;
use deskpilot_core::ports::capture::ScreenCapture;
use image::RgbaImage;
use tracing::debug;
use xcap::Monitor;

/// 스크린 캡처: xcap 기반
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapScreenCapture;

impl XcapScreenCapture {
    /// 새 캡처 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 주 모니터 스크린 캡처 (동기)
    pub fn capture_primary(&self) -> Result<RgbaImage, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        // 주 모니터가 없으면 첫 번째 모니터
        let index = monitors
            .iter()
            .position(|m| m.is_primary().unwrap_or(false))
            .unwrap_or(0);
        let monitor = monitors
            .into_iter()
            .nth(index)
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))?;

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        debug!("스크린 캡처 완료: {}x{}", image.width(), image.height());
        Ok(image)
    }

    /// 사용 가능한 모니터 수
    pub fn monitor_count() -> Result<usize, CoreError> {
        Monitor::all()
            .map(|m| m.len())
            .map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))
    }
}

#[async_trait]
impl ScreenCapture for XcapScreenCapture {
    async fn capture(&self) -> Result<Frame, CoreError> {
        let capturer = *self;
        let image = tokio::task::spawn_blocking(move || capturer.capture_primary())
            .await
            .map_err(|e| CoreError::Capture(format!("캡처 작업 조인 실패: {e}")))??;

        let (width, height) = image.dimensions();
        // 커서 위치는 입력 드라이버가 채운다
        Frame::new(width, height, image.into_raw())
    }
}
