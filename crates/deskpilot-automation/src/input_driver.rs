//! 입력 드라이버 구현.
//!
//! `NoOpInputDriver` (dry-run/테스트용)와 `EnigoInputDriver` (실제 입력, `enigo` feature)를 제공한다.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use deskpilot_core::error::CoreError;
use deskpilot_core::models::geometry::Point;
use deskpilot_core::ports::input_driver::{InputDriver, MouseButton};

// ============================================================
// NoOpInputDriver: dry-run/테스트용
// ============================================================

/// No-Op 입력 드라이버: 모든 입력을 로깅만 하고 실행하지 않음
///
/// 상대 이동과 커서 조회가 일관되도록 가상 커서 위치만 추적한다.
pub struct NoOpInputDriver {
    cursor: Mutex<Point>,
}

impl NoOpInputDriver {
    pub fn new() -> Self {
        Self {
            cursor: Mutex::new(Point::default()),
        }
    }
}

impl Default for NoOpInputDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputDriver for NoOpInputDriver {
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError> {
        debug!(x, y, "[NoOp] 마우스 이동");
        *self.cursor.lock() = Point::new(x, y);
        Ok(())
    }

    async fn mouse_move_relative(&self, dx: i32, dy: i32) -> Result<(), CoreError> {
        let mut cursor = self.cursor.lock();
        *cursor = Point::new(cursor.x.saturating_add(dx), cursor.y.saturating_add(dy));
        debug!(dx, dy, x = cursor.x, y = cursor.y, "[NoOp] 마우스 상대 이동");
        Ok(())
    }

    async fn mouse_click(&self, button: MouseButton, double: bool) -> Result<(), CoreError> {
        debug!(?button, double, "[NoOp] 마우스 클릭");
        Ok(())
    }

    async fn drag_to(&self, x: i32, y: i32) -> Result<(), CoreError> {
        debug!(x, y, "[NoOp] 드래그");
        *self.cursor.lock() = Point::new(x, y);
        Ok(())
    }

    async fn scroll(&self, amount: i32) -> Result<(), CoreError> {
        debug!(amount, "[NoOp] 스크롤");
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        debug!(text_len = text.len(), "[NoOp] 텍스트 입력");
        Ok(())
    }

    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 누름");
        Ok(())
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        debug!(key, "[NoOp] 키 놓음");
        Ok(())
    }

    async fn hotkey(&self, keys: &[String]) -> Result<(), CoreError> {
        debug!(?keys, "[NoOp] 단축키 실행");
        Ok(())
    }

    async fn cursor_position(&self) -> Option<Point> {
        Some(*self.cursor.lock())
    }

    fn platform(&self) -> &str {
        "noop"
    }
}

// ============================================================
// EnigoInputDriver: 실제 마우스/키보드 입력
// ============================================================

/// 실제 마우스/키보드 입력 드라이버 (enigo 기반)
///
/// macOS: Accessibility 권한 필요
/// Windows: UIAccess 또는 관리자 권한 필요
/// Linux: X11 또는 Wayland + uinput 권한 필요
#[cfg(feature = "enigo")]
pub struct EnigoInputDriver {
    /// enigo 인스턴스 (Send지만 !Sync → tokio::sync::Mutex 사용)
    enigo: tokio::sync::Mutex<enigo::Enigo>,
}

#[cfg(feature = "enigo")]
impl EnigoInputDriver {
    /// 새 EnigoInputDriver 생성
    pub fn new() -> Result<Self, CoreError> {
        let settings = enigo::Settings::default();
        let enigo = enigo::Enigo::new(&settings)
            .map_err(|e| CoreError::Input(format!("입력 드라이버 초기화 실패: {e}")))?;
        Ok(Self {
            enigo: tokio::sync::Mutex::new(enigo),
        })
    }

    /// 정규화된 키 이름 → enigo 키. 알 수 없는 이름은 `CoreError::Input`.
    fn parse_key(key: &str) -> Result<enigo::Key, CoreError> {
        use enigo::Key;

        let key = crate::keys::normalize_key(key);
        let parsed = match key.as_str() {
            "enter" => Key::Return,
            "tab" => Key::Tab,
            "escape" => Key::Escape,
            "backspace" => Key::Backspace,
            "delete" => Key::Delete,
            "space" => Key::Space,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "up" => Key::UpArrow,
            "down" => Key::DownArrow,
            "left" => Key::LeftArrow,
            "right" => Key::RightArrow,
            "ctrl" => Key::Control,
            "shift" => Key::Shift,
            "alt" => Key::Alt,
            "meta" => Key::Meta,
            "capslock" => Key::CapsLock,
            "f1" => Key::F1,
            "f2" => Key::F2,
            "f3" => Key::F3,
            "f4" => Key::F4,
            "f5" => Key::F5,
            "f6" => Key::F6,
            "f7" => Key::F7,
            "f8" => Key::F8,
            "f9" => Key::F9,
            "f10" => Key::F10,
            "f11" => Key::F11,
            "f12" => Key::F12,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Key::Unicode(ch),
                    _ => return Err(CoreError::Input(format!("알 수 없는 키: {other}"))),
                }
            }
        };
        Ok(parsed)
    }

    fn button(button: MouseButton) -> enigo::Button {
        match button {
            MouseButton::Left => enigo::Button::Left,
            MouseButton::Right => enigo::Button::Right,
        }
    }
}

#[cfg(feature = "enigo")]
#[async_trait]
impl InputDriver for EnigoInputDriver {
    async fn mouse_move(&self, x: i32, y: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(x, y, "[Enigo] 마우스 이동");
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(x, y, enigo::Coordinate::Abs)
            .map_err(|e| CoreError::Input(format!("마우스 이동 실패: {e}")))
    }

    async fn mouse_move_relative(&self, dx: i32, dy: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(dx, dy, "[Enigo] 마우스 상대 이동");
        let mut enigo = self.enigo.lock().await;
        enigo
            .move_mouse(dx, dy, enigo::Coordinate::Rel)
            .map_err(|e| CoreError::Input(format!("마우스 상대 이동 실패: {e}")))
    }

    async fn mouse_click(&self, button: MouseButton, double: bool) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(?button, double, "[Enigo] 마우스 클릭");
        let mut enigo = self.enigo.lock().await;
        let clicks = if double { 2 } else { 1 };
        for _ in 0..clicks {
            enigo
                .button(Self::button(button), enigo::Direction::Click)
                .map_err(|e| CoreError::Input(format!("마우스 클릭 실패: {e}")))?;
        }
        Ok(())
    }

    async fn drag_to(&self, x: i32, y: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(x, y, "[Enigo] 드래그");
        let mut enigo = self.enigo.lock().await;
        enigo
            .button(enigo::Button::Left, enigo::Direction::Press)
            .map_err(|e| CoreError::Input(format!("드래그 시작 실패: {e}")))?;
        let moved = enigo.move_mouse(x, y, enigo::Coordinate::Abs);
        // 이동 실패와 무관하게 버튼은 놓는다
        let released = enigo.button(enigo::Button::Left, enigo::Direction::Release);
        moved.map_err(|e| CoreError::Input(format!("드래그 이동 실패: {e}")))?;
        released.map_err(|e| CoreError::Input(format!("드래그 종료 실패: {e}")))
    }

    async fn scroll(&self, amount: i32) -> Result<(), CoreError> {
        use enigo::Mouse;
        debug!(amount, "[Enigo] 스크롤");
        let mut enigo = self.enigo.lock().await;
        enigo
            .scroll(amount, enigo::Axis::Vertical)
            .map_err(|e| CoreError::Input(format!("스크롤 실패: {e}")))
    }

    async fn type_text(&self, text: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(text_len = text.len(), "[Enigo] 텍스트 입력");
        let mut enigo = self.enigo.lock().await;
        enigo
            .text(text)
            .map_err(|e| CoreError::Input(format!("텍스트 입력 실패: {e}")))
    }

    async fn key_press(&self, key: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(key, "[Enigo] 키 누름");
        let parsed = Self::parse_key(key)?;
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(parsed, enigo::Direction::Press)
            .map_err(|e| CoreError::Input(format!("키 누름 실패: {e}")))
    }

    async fn key_release(&self, key: &str) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(key, "[Enigo] 키 놓음");
        let parsed = Self::parse_key(key)?;
        let mut enigo = self.enigo.lock().await;
        enigo
            .key(parsed, enigo::Direction::Release)
            .map_err(|e| CoreError::Input(format!("키 놓음 실패: {e}")))
    }

    async fn hotkey(&self, keys: &[String]) -> Result<(), CoreError> {
        use enigo::Keyboard;
        debug!(?keys, "[Enigo] 단축키 실행");
        let parsed = keys
            .iter()
            .map(|k| Self::parse_key(k))
            .collect::<Result<Vec<_>, _>>()?;
        let mut enigo = self.enigo.lock().await;
        // 모든 키 순서대로 Press → 역순 Release
        for key in &parsed {
            enigo
                .key(*key, enigo::Direction::Press)
                .map_err(|e| CoreError::Input(format!("단축키 Press 실패: {e}")))?;
        }
        for key in parsed.iter().rev() {
            enigo
                .key(*key, enigo::Direction::Release)
                .map_err(|e| CoreError::Input(format!("단축키 Release 실패: {e}")))?;
        }
        Ok(())
    }

    async fn cursor_position(&self) -> Option<Point> {
        use enigo::Mouse;
        let enigo = self.enigo.lock().await;
        enigo.location().ok().map(|(x, y)| Point::new(x, y))
    }

    fn platform(&self) -> &str {
        #[cfg(target_os = "macos")]
        {
            "macos"
        }
        #[cfg(target_os = "windows")]
        {
            "windows"
        }
        #[cfg(target_os = "linux")]
        {
            "linux"
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            "unknown"
        }
    }
}

/// 설정에 따른 입력 드라이버 생성
///
/// `enigo` 요청 시 초기화에 실패하거나 feature가 꺼져 있으면 NoOp으로 폴백한다.
pub fn create_input_driver(
    kind: deskpilot_core::config::InputDriverKind,
) -> std::sync::Arc<dyn InputDriver> {
    use deskpilot_core::config::InputDriverKind;

    if kind == InputDriverKind::Enigo {
        #[cfg(feature = "enigo")]
        {
            match EnigoInputDriver::new() {
                Ok(driver) => {
                    tracing::info!("실제 입력 드라이버 (enigo) 초기화 완료");
                    return std::sync::Arc::new(driver);
                }
                Err(e) => {
                    tracing::warn!("enigo 초기화 실패, NoOp 폴백: {e}");
                }
            }
        }
        #[cfg(not(feature = "enigo"))]
        tracing::warn!("enigo feature 비활성화 빌드, NoOp 입력 드라이버 사용");
    }
    std::sync::Arc::new(NoOpInputDriver::new())
}

// ============================================================
// 테스트
// ============================================================
