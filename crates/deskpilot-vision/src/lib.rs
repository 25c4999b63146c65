//! # deskpilot-vision
//!
//! 화면 인식 크레이트.
//! 캡처된 프레임을 대표 색상, 연결 영역 바운딩 박스, 창 장식(제목 표시줄과
//! 제어 버튼), OCR 텍스트 델타 같은 구조화된 사실로 변환한다.
//!
//! 모든 분석 함수는 이미지에 대한 순수 함수이며 상태를 갖지 않는다.

pub mod analyzer;
pub mod capture;
pub mod labeling;
pub mod local_ocr_provider;
pub mod ocr;
pub mod palette;
pub mod regions;
pub mod text_delta;
pub mod window_chrome;
