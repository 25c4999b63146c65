//! 스크린 캡처 포트.
//!
//! 구현: `deskpilot-vision` crate (xcap)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::frame::Frame;

/// 화면 캡처 인터페이스. 실패는 현재 태스크에 치명적이다.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// 주 모니터 전체를 RGBA 프레임으로 캡처 (가능하면 커서 위치 포함)
    async fn capture(&self) -> Result<Frame, CoreError>;
}
