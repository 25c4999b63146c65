//! # deskpilot-core
//!
//! DeskPilot 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`cancel`]: 태스크별 협력적 취소 토큰
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/저장)

pub mod cancel;
pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::task::TaskStatus;

    #[test]
    fn task_status_serde_uses_wire_names() {
        let json = serde_json::to_string(&TaskStatus::Queued).unwrap();
        assert_eq!(json, "\"queued\"");
        let status: TaskStatus = serde_json::from_str("\"broken\"").unwrap();
        assert_eq!(status, TaskStatus::Broken);
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::AppConfig::default_config();
        assert_eq!(config.agent.max_iterations, 40);
        assert_eq!(config.agent.cursor_band_px, 23);
        assert_eq!(config.vision.report_colors, 10);
        assert_eq!(config.vision.region_colors, 40);
        assert_eq!(config.vision.binarize_threshold, 98);
        assert!(!config.vision.ocr_enabled);
    }
}
