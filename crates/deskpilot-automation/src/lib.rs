//! # deskpilot-automation
//!
//! 입력 주입 크레이트.
//! 판단 서비스가 내린 액션 배치를 시퀀스 순서대로 실제 마우스/키보드 입력으로 옮긴다.
//! 입력 실패는 경고로 남기고 배치를 계속 진행하며, 취소만 호출자에게 전파된다.

pub mod executor;
pub mod input_driver;
pub mod keys;
