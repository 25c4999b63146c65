//! 이벤트 알림 포트.
//!
//! 구현: `deskpilot-agent` crate (`EventBus`, tokio broadcast)

use crate::models::event::AgentEvent;

/// 이벤트 팬아웃: 전달은 best-effort이며 호출자를 막지 않는다
pub trait NotificationSink: Send + Sync {
    /// 이벤트 발행. 구독자가 없거나 느려도 실패하지 않는다.
    fn publish(&self, event: AgentEvent);
}
