//! 입력 드라이버 포트.
//!
//! 마우스/키보드 조작을 위한 크로스 플랫폼 인터페이스를 정의한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::geometry::Point;

/// 마우스 버튼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// 입력 드라이버: 마우스/키보드 시뮬레이션 인터페이스
///
/// 구현체: `EnigoInputDriver` (실제 입력), `NoOpInputDriver` (dry-run/테스트용)
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// 절대 좌표로 마우스 이동
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError>;

    /// 현재 위치 기준 상대 이동
    async fn mouse_move_relative(&self, dx: i32, dy: i32) -> Result<(), CoreError>;

    /// 현재 위치에서 클릭 (`double`이면 더블 클릭)
    async fn mouse_click(&self, button: MouseButton, double: bool) -> Result<(), CoreError>;

    /// 왼쪽 버튼을 누른 채 목표 좌표로 이동 후 놓기
    async fn drag_to(&self, x: i32, y: i32) -> Result<(), CoreError>;

    /// 세로 스크롤 (양수 = 아래)
    async fn scroll(&self, amount: i32) -> Result<(), CoreError>;

    /// 텍스트 입력
    async fn type_text(&self, text: &str) -> Result<(), CoreError>;

    /// 키 누름
    async fn key_press(&self, key: &str) -> Result<(), CoreError>;

    /// 키 놓음
    async fn key_release(&self, key: &str) -> Result<(), CoreError>;

    /// 단축키 (복합 키): 순서대로 누르고 역순으로 놓는다
    async fn hotkey(&self, keys: &[String]) -> Result<(), CoreError>;

    /// 현재 커서 위치 (알 수 없으면 None)
    async fn cursor_position(&self) -> Option<Point>;

    /// 플랫폼 이름 (예: "macos", "windows", "linux")
    fn platform(&self) -> &str;
}
