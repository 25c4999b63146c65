//! # deskpilot-decision
//!
//! 판단 서비스 어댑터 크레이트.
//! 인식 스냅샷을 LLM 채팅 요청으로 바꾸고, 응답에서 서브태스크/액션 배치/검증 결과를
//! 복구한다. 형식이 깨진 응답은 오류 대신 안전한 기본값으로 대체하며,
//! 통신 실패만 `CoreError::Network`로 전파한다.
//!
//! **중요**: LLM에는 이미지를 전송하지 않으며, 인식 결과 텍스트(JSON)만 전달한다.

pub mod chat;
pub mod prompts;
pub mod salvage;
pub mod service;
pub mod tokens;

pub use chat::{ChatClient, ChatMessage, HttpChatClient};
pub use service::LlmDecisionService;
pub use tokens::TokenTracker;
