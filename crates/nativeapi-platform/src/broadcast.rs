//! In-process broadcast center: messages sent on a topic are delivered to
//! every subscriber on the sending thread.

use tracing::debug;

use crate::event::{BroadcastEvent, EventHandler, EventSource, Listeners, SubscriptionId};
use crate::{BroadcastProvider, Result};

#[derive(Default)]
pub struct LocalBroadcastCenter {
    listeners: Listeners<BroadcastEvent>,
}

impl LocalBroadcastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl EventSource<BroadcastEvent> for LocalBroadcastCenter {
    fn subscribe(&self, handler: EventHandler<BroadcastEvent>) -> Result<SubscriptionId> {
        Ok(self.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners.remove(subscription);
    }
}

impl BroadcastProvider for LocalBroadcastCenter {
    fn send(&self, topic: &str, message: &str) -> Result<()> {
        if topic.is_empty() {
            return Err("broadcast topic must not be empty".into());
        }
        debug!(topic, bytes = message.len(), "broadcast sent");
        self.listeners.emit(&BroadcastEvent {
            topic: topic.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn send_delivers_topic_and_message() {
        let center = LocalBroadcastCenter::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        center
            .subscribe(Arc::new(move |event: &BroadcastEvent| {
                sink.lock().unwrap().push(event.clone());
            }))
            .unwrap();

        center.send("settings", "theme=dark").unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].topic, "settings");
        assert_eq!(received[0].message, "theme=dark");
    }

    #[test]
    fn empty_topic_is_rejected() {
        let center = LocalBroadcastCenter::new();
        assert!(center.send("", "hello").is_err());
    }
}
