//! Global key monitoring.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use nativeapi_platform::{KeyboardEvent, KeyboardProvider, ModifierKeys};

use crate::abi::{KeyCallback, ModifierKeysCallback};
use crate::bridge::{CallbackSlot, Dispatcher, EventBridge};
use crate::config::EventsConfig;
use crate::error::Result;
use crate::id::ResourceKind;
use crate::marshal;

#[derive(Default)]
struct KeyboardCallbacks {
    pressed: CallbackSlot<KeyCallback>,
    released: CallbackSlot<KeyCallback>,
    modifiers: CallbackSlot<ModifierKeysCallback>,
}

struct Shared {
    callbacks: KeyboardCallbacks,
    dispatcher: Dispatcher,
    modifiers: AtomicU32,
}

impl Shared {
    fn dispatch(&self, event: &KeyboardEvent) {
        match event {
            KeyboardEvent::KeyPressed(key) => {
                self.dispatcher.deliver(
                    "key_pressed",
                    &self.callbacks.pressed,
                    || marshal::string(key),
                    |callback, key| callback(key),
                );
            }
            KeyboardEvent::KeyReleased(key) => {
                self.dispatcher.deliver(
                    "key_released",
                    &self.callbacks.released,
                    || marshal::string(key),
                    |callback, key| callback(key),
                );
            }
            KeyboardEvent::ModifiersChanged(modifiers) => {
                // Stored before delivery so the callback can query it.
                self.modifiers.store(modifiers.bits(), Ordering::SeqCst);
                let bits = modifiers.bits();
                self.dispatcher.deliver(
                    "modifier_keys_changed",
                    &self.callbacks.modifiers,
                    || Ok(bits),
                    |callback, bits| callback(bits),
                );
            }
        }
    }
}

pub struct KeyboardMonitor {
    shared: Arc<Shared>,
    bridge: EventBridge<dyn KeyboardProvider, KeyboardEvent>,
}

impl KeyboardMonitor {
    pub fn new(provider: Arc<dyn KeyboardProvider>, events: &EventsConfig) -> Self {
        let shared = Arc::new(Shared {
            callbacks: KeyboardCallbacks::default(),
            dispatcher: Dispatcher::new(ResourceKind::Keyboard, events.log_deliveries),
            modifiers: AtomicU32::new(ModifierKeys::NONE.bits()),
        });
        let dispatch = Arc::clone(&shared);
        let bridge = EventBridge::new(
            ResourceKind::Keyboard,
            provider,
            Arc::new(move |event: &KeyboardEvent| dispatch.dispatch(event)),
        );
        Self { shared, bridge }
    }

    pub fn start(&self) -> Result<()> {
        self.bridge.start_listening()
    }

    /// Stop monitoring, drop every callback and forget the modifier state.
    pub fn stop(&self) {
        self.bridge.stop_listening();
        let callbacks = &self.shared.callbacks;
        callbacks.pressed.clear();
        callbacks.released.clear();
        callbacks.modifiers.clear();
        self.shared
            .modifiers
            .store(ModifierKeys::NONE.bits(), Ordering::SeqCst);
    }

    pub fn is_monitoring(&self) -> bool {
        self.bridge.is_listening()
    }

    /// Last modifier set reported by the provider.
    pub fn modifier_keys(&self) -> ModifierKeys {
        ModifierKeys::from_bits_truncate(self.shared.modifiers.load(Ordering::SeqCst))
    }

    /// The callback owns the key name and releases it with `nativeapi_free_string`.
    pub fn on_key_pressed(&self, callback: Option<KeyCallback>) {
        self.shared.callbacks.pressed.register(callback);
    }

    pub fn on_key_released(&self, callback: Option<KeyCallback>) {
        self.shared.callbacks.released.register(callback);
    }

    pub fn on_modifier_keys_changed(&self, callback: Option<ModifierKeysCallback>) {
        self.shared.callbacks.modifiers.register(callback);
    }
}
