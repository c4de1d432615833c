/// Typed in-process progress notifications
///
/// Publishers fire and forget. Subscribers re-derive their full state from the
/// progress store when an event arrives; only `XpGained` carries a value that
/// matters, and the XP change it reports has already been applied by the
/// publisher.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::{CompletedItem, LessonId};

/// Events buffered per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    LessonCompleted { lesson_id: LessonId },
    /// Positive for awards, negative for revocations
    XpGained { amount: i64 },
    ItemCompleted { item: CompletedItem },
}

/// Broadcast bus for `ProgressEvent`s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Publish an event; returns how many subscribers will see it
    pub fn publish(&self, event: ProgressEvent) -> usize {
        tracing::debug!("Publishing progress event: {:?}", event);
        // No subscribers is fine
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(ProgressEvent::XpGained { amount: 5 }), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(ProgressEvent::LessonCompleted { lesson_id: 3 });
        bus.publish(ProgressEvent::ItemCompleted {
            item: CompletedItem::review(1),
        });

        assert_eq!(rx.recv().await.unwrap(), ProgressEvent::LessonCompleted { lesson_id: 3 });
        match rx.recv().await.unwrap() {
            ProgressEvent::ItemCompleted { item } => assert!(item.is_review()),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
