//! DeskPilot 도메인 모델.
//!
//! 인식 결과(색상, 영역, 창, OCR), 액션, 태스크, 이벤트 데이터 구조체를 정의한다.
//! 판단 서비스와 이벤트 구독자에게 전달되는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod action;
pub mod color;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod ocr;
pub mod perception;
pub mod task;
pub mod window;
