//! DeskPilot 핵심 에러 타입.
//!
//! 포트 경계를 넘는 모든 실패는 `CoreError`로 표현한다.
//! 태스크 워커는 variant 종류로 최종 상태(`broken` / `canceled`)를 결정한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Task")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 판단 서비스 통신 실패 (연결 실패, 오류 응답, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 스크린 캡처 실패: 현재 태스크에 치명적
    #[error("스크린 캡처 실패: {0}")]
    Capture(String),

    /// OCR 처리 실패
    #[error("OCR 에러: {0}")]
    OcrError(String),

    /// 입력 주입 실패 (로그만 남기고 전파하지 않는다)
    #[error("입력 주입 실패: {0}")]
    Input(String),

    /// 협력적 취소 감지
    #[error("작업 취소됨")]
    Canceled,

    /// 실행 타임아웃
    #[error("실행 타임아웃: {timeout_ms}ms 초과")]
    ExecutionTimeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 취소로 인한 에러인지 여부
    pub fn is_canceled(&self) -> bool {
        matches!(self, CoreError::Canceled)
    }
}
