//! # deskpilot-agent
//!
//! 태스크 오케스트레이션 크레이트.
//! 태스크 레지스트리, FIFO 대기열, 단일 실행 슬롯을 하나의 소유 타입
//! ([`TaskOrchestrator`])으로 감싸고, 실행 슬롯이 비면 대기열 선두를 워커로 넘긴다.
//!
//! ## 구조
//!
//! - [`orchestrator`]: 레지스트리 + 대기열 + 디스패처
//! - [`worker`]: 태스크별 인식 → 판단 → 실행 → 검증 루프
//! - [`assist`]: 실행 중 태스크에 대한 사용자 도움 메시지 우편함
//! - [`event_bus`]: `tokio::broadcast` 기반 `NotificationSink`

pub mod assist;
pub mod event_bus;
pub mod orchestrator;
pub mod worker;

pub use event_bus::EventBus;
pub use orchestrator::TaskOrchestrator;
pub use worker::{TaskWorker, WorkerOutcome};
