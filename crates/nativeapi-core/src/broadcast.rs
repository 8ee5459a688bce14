//! Topic broadcasts. Only topics registered through `register_receiver`
//! reach the callback.

use std::collections::HashSet;
use std::os::raw::c_char;
use std::sync::{Arc, PoisonError, RwLock};

use nativeapi_platform::{BroadcastEvent, BroadcastProvider};
use tracing::debug;

use crate::abi::BroadcastReceivedCallback;
use crate::bridge::{CallbackSlot, Dispatcher, EventBridge};
use crate::config::EventsConfig;
use crate::error::{Error, Result};
use crate::id::ResourceKind;
use crate::marshal;

struct Shared {
    topics: RwLock<HashSet<String>>,
    received: CallbackSlot<BroadcastReceivedCallback>,
    dispatcher: Dispatcher,
}

impl Shared {
    fn is_registered(&self, topic: &str) -> bool {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(topic)
    }

    fn dispatch(&self, event: &BroadcastEvent) {
        if !self.is_registered(&event.topic) {
            return;
        }
        self.dispatcher.deliver(
            "broadcast_received",
            &self.received,
            || marshal_pair(&event.topic, &event.message),
            |callback, (topic, message)| callback(topic, message),
        );
    }
}

fn marshal_pair(topic: &str, message: &str) -> Result<(*mut c_char, *mut c_char)> {
    let topic = marshal::string(topic)?;
    match marshal::string(message) {
        Ok(message) => Ok((topic, message)),
        Err(err) => {
            // SAFETY: `topic` was allocated above and never handed out.
            unsafe { marshal::free_string(topic) };
            Err(err)
        }
    }
}

pub struct BroadcastCenter {
    provider: Arc<dyn BroadcastProvider>,
    shared: Arc<Shared>,
    bridge: EventBridge<dyn BroadcastProvider, BroadcastEvent>,
}

impl BroadcastCenter {
    pub fn new(provider: Arc<dyn BroadcastProvider>, events: &EventsConfig) -> Self {
        let shared = Arc::new(Shared {
            topics: RwLock::new(HashSet::new()),
            received: CallbackSlot::new(),
            dispatcher: Dispatcher::new(ResourceKind::Broadcast, events.log_deliveries),
        });
        let dispatch = Arc::clone(&shared);
        let bridge = EventBridge::new(
            ResourceKind::Broadcast,
            Arc::clone(&provider),
            Arc::new(move |event: &BroadcastEvent| dispatch.dispatch(event)),
        );
        Self {
            provider,
            shared,
            bridge,
        }
    }

    pub fn send(&self, topic: &str, message: &str) -> Result<()> {
        self.provider
            .send(topic, message)
            .map_err(|source| Error::Provider {
                kind: ResourceKind::Broadcast,
                source,
            })
    }

    /// Start receiving `topic` and make sure the bridge is listening.
    ///
    /// Start and stop decisions are made under the topics write lock.
    pub fn register_receiver(&self, topic: &str) -> Result<()> {
        let mut topics = self
            .shared
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if topics.insert(topic.to_string()) {
            debug!(topic, "receiver registered");
        }
        self.bridge.start_listening()
    }

    /// Returns false if `topic` was not registered. Removing the last topic
    /// stops the bridge.
    pub fn unregister_receiver(&self, topic: &str) -> bool {
        let mut topics = self
            .shared
            .topics
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = topics.remove(topic);
        if removed {
            debug!(topic, "receiver unregistered");
            if topics.is_empty() {
                self.bridge.stop_listening();
            }
        }
        removed
    }

    pub fn is_receiving(&self, topic: &str) -> bool {
        self.shared.is_registered(topic)
    }

    pub fn start_listening(&self) -> Result<()> {
        self.bridge.start_listening()
    }

    pub fn stop_listening(&self) {
        self.bridge.stop_listening();
        self.shared.received.clear();
    }

    pub fn is_listening(&self) -> bool {
        self.bridge.is_listening()
    }

    /// The callback owns both strings and releases each with
    /// `nativeapi_free_string`.
    pub fn on_broadcast_received(&self, callback: Option<BroadcastReceivedCallback>) {
        self.shared.received.register(callback);
    }
}
