//! Display queries and hot-plug notifications. Displays are not registered;
//! every query asks the provider again.

use std::sync::Arc;

use nativeapi_platform::{Display, DisplayEvent, DisplayProvider, Point};

use crate::abi::DisplayCallback;
use crate::bridge::{CallbackSlot, Dispatcher, EventBridge};
use crate::config::EventsConfig;
use crate::error::{BoxError, Error, Result};
use crate::id::ResourceKind;
use crate::marshal;

#[derive(Default)]
struct DisplayCallbacks {
    added: CallbackSlot<DisplayCallback>,
    removed: CallbackSlot<DisplayCallback>,
}

struct Shared {
    callbacks: DisplayCallbacks,
    dispatcher: Dispatcher,
}

impl Shared {
    fn dispatch(&self, event: &DisplayEvent) {
        let (name, slot, display) = match event {
            DisplayEvent::Added(display) => ("display_added", &self.callbacks.added, display),
            DisplayEvent::Removed(display) => ("display_removed", &self.callbacks.removed, display),
        };
        self.dispatcher.deliver(
            name,
            slot,
            || marshal::display(display),
            |callback, record| callback(record),
        );
    }
}

pub struct DisplayManager {
    provider: Arc<dyn DisplayProvider>,
    shared: Arc<Shared>,
    bridge: EventBridge<dyn DisplayProvider, DisplayEvent>,
}

impl DisplayManager {
    pub fn new(provider: Arc<dyn DisplayProvider>, events: &EventsConfig) -> Self {
        let shared = Arc::new(Shared {
            callbacks: DisplayCallbacks::default(),
            dispatcher: Dispatcher::new(ResourceKind::Display, events.log_deliveries),
        });
        let dispatch = Arc::clone(&shared);
        let bridge = EventBridge::new(
            ResourceKind::Display,
            Arc::clone(&provider),
            Arc::new(move |event: &DisplayEvent| dispatch.dispatch(event)),
        );
        Self {
            provider,
            shared,
            bridge,
        }
    }

    pub fn get_all(&self) -> Result<Vec<Display>> {
        self.provider.displays().map_err(provider_error)
    }

    pub fn get_primary(&self) -> Result<Display> {
        self.provider.primary_display().map_err(provider_error)
    }

    pub fn get_cursor_position(&self) -> Result<Point> {
        self.provider.cursor_position().map_err(provider_error)
    }

    pub fn start_listening(&self) -> Result<()> {
        self.bridge.start_listening()
    }

    pub fn stop_listening(&self) {
        self.bridge.stop_listening();
        self.shared.callbacks.added.clear();
        self.shared.callbacks.removed.clear();
    }

    pub fn is_listening(&self) -> bool {
        self.bridge.is_listening()
    }

    /// The callback receives a record whose strings it must release with
    /// `native_display_free`.
    pub fn on_display_added(&self, callback: Option<DisplayCallback>) {
        self.shared.callbacks.added.register(callback);
    }

    pub fn on_display_removed(&self, callback: Option<DisplayCallback>) {
        self.shared.callbacks.removed.register(callback);
    }
}

fn provider_error(source: BoxError) -> Error {
    Error::Provider {
        kind: ResourceKind::Display,
        source,
    }
}
