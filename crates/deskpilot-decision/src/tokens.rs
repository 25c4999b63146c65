//! 토큰 사용량 집계.
//!
//! 판단 서비스 요청/응답마다 추정 토큰 수(문자 수 / 4, 올림)를 프로세스 전역 누계에 더하고
//! `TokenUsage` 이벤트로 알린다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::ports::notifier::NotificationSink;

/// 토큰 하나당 평균 문자 수
const CHARS_PER_TOKEN: u64 = 4;

/// 추정 토큰 수
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(CHARS_PER_TOKEN)
}

/// 누적 토큰 집계기
pub struct TokenTracker {
    total: AtomicU64,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl TokenTracker {
    pub fn new(notifier: Option<Arc<dyn NotificationSink>>) -> Self {
        Self {
            total: AtomicU64::new(0),
            notifier,
        }
    }

    /// 텍스트의 추정 토큰을 더하고 새 누계를 반환
    pub fn record<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> u64 {
        let added: u64 = texts.into_iter().map(estimate_tokens).sum();
        let total = self.total.fetch_add(added, Ordering::Relaxed) + added;
        if let Some(notifier) = &self.notifier {
            notifier.publish(AgentEvent::TokenUsage { total });
        }
        total
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for TokenTracker {
    fn default() -> Self {
        Self::new(None)
    }
}
