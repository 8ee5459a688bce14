//! Window registry plus the window notification bridge.
//!
//! Two subscriptions are held on the provider. The lifecycle one is always
//! active and evicts windows the OS closed; the bridge one exists only
//! between `start_listening` and `stop_listening` and feeds the callbacks.
//! `Closed` is delivered by the lifecycle handler, which resolves the id
//! before evicting it.

use std::sync::{Arc, Weak};

use nativeapi_platform::{NativeWindow, WindowEvent, WindowOptions, WindowProvider};
use tracing::{debug, warn};

use crate::abi::{NativePoint, NativeSize, WindowCallback, WindowMovedCallback, WindowResizedCallback};
use crate::bridge::{CallbackSlot, Delivery, Dispatcher, EventBridge};
use crate::config::EventsConfig;
use crate::error::{Error, Result};
use crate::id::{ResourceId, ResourceKind};
use crate::registry::Registry;

type WindowBridge = EventBridge<dyn WindowProvider, WindowEvent>;

#[derive(Default)]
struct WindowCallbacks {
    focused: CallbackSlot<WindowCallback>,
    blurred: CallbackSlot<WindowCallback>,
    resized: CallbackSlot<WindowResizedCallback>,
    moved: CallbackSlot<WindowMovedCallback>,
    closed: CallbackSlot<WindowCallback>,
}

impl WindowCallbacks {
    fn clear_all(&self) {
        self.focused.clear();
        self.blurred.clear();
        self.resized.clear();
        self.moved.clear();
        self.closed.clear();
    }
}

struct Shared {
    registry: Registry<dyn NativeWindow>,
    callbacks: WindowCallbacks,
    dispatcher: Dispatcher,
}

impl Shared {
    fn resolve(&self, handle: u64) -> Option<ResourceId> {
        self.registry.find(|window| window.native_handle() == handle)
    }

    fn dispatch(&self, event: &WindowEvent) {
        let Some(id) = self.resolve(event.handle()) else {
            debug!(handle = event.handle(), "notification for unregistered window");
            return;
        };
        let raw = id.get();
        let callbacks = &self.callbacks;
        match event {
            WindowEvent::Focused { .. } => {
                self.dispatcher
                    .deliver("focused", &callbacks.focused, || Ok(raw), |callback, id| callback(id));
            }
            WindowEvent::Blurred { .. } => {
                self.dispatcher
                    .deliver("blurred", &callbacks.blurred, || Ok(raw), |callback, id| callback(id));
            }
            WindowEvent::Resized { size, .. } => {
                self.dispatcher.deliver(
                    "resized",
                    &callbacks.resized,
                    || Ok(NativeSize::from(*size)),
                    |callback, size| callback(raw, size),
                );
            }
            WindowEvent::Moved { position, .. } => {
                self.dispatcher.deliver(
                    "moved",
                    &callbacks.moved,
                    || Ok(NativePoint::from(*position)),
                    |callback, position| callback(raw, position),
                );
            }
            WindowEvent::Closed { .. } => {}
        }
    }

    /// Evict the window behind `handle`, then report it if asked to.
    fn retire(&self, handle: u64, notify: bool) -> Option<Delivery> {
        let id = self.resolve(handle)?;
        self.registry.remove(id);
        if !notify {
            return None;
        }
        let raw = id.get();
        Some(
            self.dispatcher
                .deliver("closed", &self.callbacks.closed, || Ok(raw), |callback, id| callback(id)),
        )
    }
}

pub struct WindowManager {
    provider: Arc<dyn WindowProvider>,
    shared: Arc<Shared>,
    bridge: Arc<WindowBridge>,
    lifecycle: WindowBridge,
}

impl WindowManager {
    pub fn new(provider: Arc<dyn WindowProvider>, events: &EventsConfig) -> Result<Self> {
        let shared = Arc::new(Shared {
            registry: Registry::new(ResourceKind::Window),
            callbacks: WindowCallbacks::default(),
            dispatcher: Dispatcher::new(ResourceKind::Window, events.log_deliveries),
        });

        let dispatch = Arc::clone(&shared);
        let bridge = Arc::new(EventBridge::new(
            ResourceKind::Window,
            Arc::clone(&provider),
            Arc::new(move |event: &WindowEvent| dispatch.dispatch(event)),
        ));

        let retire = Arc::clone(&shared);
        let listening: Weak<WindowBridge> = Arc::downgrade(&bridge);
        let lifecycle = EventBridge::new(
            ResourceKind::Window,
            Arc::clone(&provider),
            Arc::new(move |event: &WindowEvent| {
                if let WindowEvent::Closed { handle } = event {
                    let notify = listening
                        .upgrade()
                        .is_some_and(|bridge| bridge.is_listening());
                    retire.retire(*handle, notify);
                }
            }),
        );
        lifecycle.start_listening()?;

        Ok(Self {
            provider,
            shared,
            bridge,
            lifecycle,
        })
    }

    /// Create a native window and register it. Blocks for as long as the OS
    /// takes to create the window.
    pub fn create(&self, options: &WindowOptions) -> Result<ResourceId> {
        let provider = &self.provider;
        self.shared
            .registry
            .create_with(|| provider.create_window(options))
    }

    pub fn get(&self, id: ResourceId) -> Result<Arc<dyn NativeWindow>> {
        self.shared.registry.get(id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.shared.registry.contains(id)
    }

    pub fn get_all(&self) -> Vec<ResourceId> {
        self.shared.registry.get_all()
    }

    /// The registered window the OS currently has in the foreground.
    pub fn get_current(&self) -> Result<ResourceId> {
        self.provider
            .foreground_window()
            .and_then(|handle| self.shared.resolve(handle))
            .ok_or(Error::NoCurrentResource {
                kind: ResourceKind::Window,
            })
    }

    /// Run `f` against the live window behind `id`.
    pub fn with_window<T, F>(&self, id: ResourceId, f: F) -> Result<T>
    where
        F: FnOnce(&(dyn NativeWindow + 'static)) -> nativeapi_platform::Result<T>,
    {
        self.shared.registry.with(id, f)
    }

    /// Close the window natively and evict it. The id stays invalid forever.
    pub fn destroy(&self, id: ResourceId) -> Result<()> {
        self.with_window(id, |window| window.close())?;
        self.shared.registry.remove(id);
        Ok(())
    }

    /// Close every registered window. Windows that refuse are still evicted.
    pub fn destroy_all(&self) -> usize {
        let ids = self.shared.registry.get_all();
        for id in &ids {
            if let Err(err) = self.destroy(*id) {
                warn!(%id, "closing window failed: {err}");
                self.shared.registry.remove(*id);
            }
        }
        ids.len()
    }

    pub fn start_listening(&self) -> Result<()> {
        self.bridge.start_listening()
    }

    /// Stop delivering notifications and drop every registered callback.
    pub fn stop_listening(&self) {
        self.bridge.stop_listening();
        self.shared.callbacks.clear_all();
    }

    pub fn is_listening(&self) -> bool {
        self.bridge.is_listening()
    }

    pub fn on_focused(&self, callback: Option<WindowCallback>) {
        self.shared.callbacks.focused.register(callback);
    }

    pub fn on_blurred(&self, callback: Option<WindowCallback>) {
        self.shared.callbacks.blurred.register(callback);
    }

    pub fn on_resized(&self, callback: Option<WindowResizedCallback>) {
        self.shared.callbacks.resized.register(callback);
    }

    pub fn on_moved(&self, callback: Option<WindowMovedCallback>) {
        self.shared.callbacks.moved.register(callback);
    }

    pub fn on_closed(&self, callback: Option<WindowCallback>) {
        self.shared.callbacks.closed.register(callback);
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        self.lifecycle.stop_listening();
        self.bridge.stop_listening();
    }
}
