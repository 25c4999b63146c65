//! 에이전트 이벤트 버스.
//!
//! `tokio::broadcast` 기반 팬아웃. 구독자가 없거나 느려도 발행자는 막히지 않으며,
//! 뒤처진 구독자는 `Lagged`로 오래된 이벤트를 잃는다.

use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::ports::notifier::NotificationSink;
use tokio::sync::broadcast;
use tracing::debug;

/// 이벤트 버스
pub struct EventBus {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 구독자 생성
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl NotificationSink for EventBus {
    fn publish(&self, event: AgentEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        // 구독자가 없으면 Err: 무시
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(AgentEvent::TokenUsage { total: 42 });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, AgentEvent::TokenUsage { total: 42 });
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(AgentEvent::log("task-1", "시작"));

        assert!(matches!(rx1.recv().await.unwrap(), AgentEvent::Log { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), AgentEvent::Log { .. }));
    }

    #[test]
    fn publish_without_subscribers_does_not_block() {
        let bus = EventBus::new(1);
        for total in 0..10 {
            bus.publish(AgentEvent::TokenUsage { total });
        }
    }

    #[tokio::test]
    async fn slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for total in 0..5 {
            bus.publish(AgentEvent::TokenUsage { total });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap(), AgentEvent::TokenUsage { total: 3 });
    }
}
