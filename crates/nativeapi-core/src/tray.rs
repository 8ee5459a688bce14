//! Tray icon registry and click notifications.

use std::sync::Arc;

use nativeapi_platform::{NativeTray, TrayEvent, TrayProvider};
use tracing::{debug, warn};

use crate::abi::TrayCallback;
use crate::bridge::{CallbackSlot, Dispatcher, EventBridge};
use crate::config::EventsConfig;
use crate::error::Result;
use crate::id::{ResourceId, ResourceKind};
use crate::registry::Registry;

#[derive(Default)]
struct TrayCallbacks {
    clicked: CallbackSlot<TrayCallback>,
    right_clicked: CallbackSlot<TrayCallback>,
    double_clicked: CallbackSlot<TrayCallback>,
}

struct Shared {
    registry: Registry<dyn NativeTray>,
    callbacks: TrayCallbacks,
    dispatcher: Dispatcher,
}

impl Shared {
    fn dispatch(&self, event: &TrayEvent) {
        let handle = event.handle();
        let Some(id) = self.registry.find(|tray| tray.native_handle() == handle) else {
            debug!(handle, "notification for unregistered tray");
            return;
        };
        let (name, slot) = match event {
            TrayEvent::Clicked { .. } => ("clicked", &self.callbacks.clicked),
            TrayEvent::RightClicked { .. } => ("right_clicked", &self.callbacks.right_clicked),
            TrayEvent::DoubleClicked { .. } => ("double_clicked", &self.callbacks.double_clicked),
        };
        let raw = id.get();
        self.dispatcher
            .deliver(name, slot, || Ok(raw), |callback, id| callback(id));
    }
}

pub struct TrayManager {
    provider: Arc<dyn TrayProvider>,
    shared: Arc<Shared>,
    bridge: EventBridge<dyn TrayProvider, TrayEvent>,
}

impl TrayManager {
    pub fn new(provider: Arc<dyn TrayProvider>, events: &EventsConfig) -> Self {
        let shared = Arc::new(Shared {
            registry: Registry::new(ResourceKind::Tray),
            callbacks: TrayCallbacks::default(),
            dispatcher: Dispatcher::new(ResourceKind::Tray, events.log_deliveries),
        });
        let dispatch = Arc::clone(&shared);
        let bridge = EventBridge::new(
            ResourceKind::Tray,
            Arc::clone(&provider),
            Arc::new(move |event: &TrayEvent| dispatch.dispatch(event)),
        );
        Self {
            provider,
            shared,
            bridge,
        }
    }

    /// Put a new icon in the system tray. May block on the OS call.
    pub fn create(&self) -> Result<ResourceId> {
        let provider = &self.provider;
        self.shared.registry.create_with(|| provider.create_tray())
    }

    pub fn get(&self, id: ResourceId) -> Result<Arc<dyn NativeTray>> {
        self.shared.registry.get(id)
    }

    pub fn get_all(&self) -> Vec<ResourceId> {
        self.shared.registry.get_all()
    }

    pub fn with_tray<T, F>(&self, id: ResourceId, f: F) -> Result<T>
    where
        F: FnOnce(&(dyn NativeTray + 'static)) -> nativeapi_platform::Result<T>,
    {
        self.shared.registry.with(id, f)
    }

    /// Remove the icon from the tray and evict it.
    pub fn destroy(&self, id: ResourceId) -> Result<()> {
        self.with_tray(id, |tray| tray.remove())?;
        self.shared.registry.remove(id);
        Ok(())
    }

    /// Remove every registered icon. Icons that refuse are still evicted.
    pub fn destroy_all(&self) -> usize {
        let ids = self.shared.registry.get_all();
        for id in &ids {
            if let Err(err) = self.destroy(*id) {
                warn!(%id, "removing tray icon failed: {err}");
                self.shared.registry.remove(*id);
            }
        }
        ids.len()
    }

    pub fn start_listening(&self) -> Result<()> {
        self.bridge.start_listening()
    }

    pub fn stop_listening(&self) {
        self.bridge.stop_listening();
        let callbacks = &self.shared.callbacks;
        callbacks.clicked.clear();
        callbacks.right_clicked.clear();
        callbacks.double_clicked.clear();
    }

    pub fn is_listening(&self) -> bool {
        self.bridge.is_listening()
    }

    pub fn on_clicked(&self, callback: Option<TrayCallback>) {
        self.shared.callbacks.clicked.register(callback);
    }

    pub fn on_right_clicked(&self, callback: Option<TrayCallback>) {
        self.shared.callbacks.right_clicked.register(callback);
    }

    pub fn on_double_clicked(&self, callback: Option<TrayCallback>) {
        self.shared.callbacks.double_clicked.register(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nativeapi_platform::headless::HeadlessTrays;
    use std::sync::atomic::{AtomicI64, Ordering};

    static LAST_RIGHT_CLICK: AtomicI64 = AtomicI64::new(0);

    extern "C" fn record_right_click(tray_id: i64) {
        LAST_RIGHT_CLICK.store(tray_id, Ordering::SeqCst);
    }

    #[test]
    fn tray_properties_round_trip_through_provider() {
        let manager = TrayManager::new(Arc::new(HeadlessTrays::default()), &EventsConfig::default());
        let id = manager.create().unwrap();
        assert_eq!(manager.with_tray(id, |tray| tray.title()).unwrap(), "");
        manager.with_tray(id, |tray| tray.set_tooltip("Sync running")).unwrap();
        assert_eq!(manager.with_tray(id, |tray| tray.tooltip()).unwrap(), "Sync running");
    }

    #[test]
    fn destroyed_tray_is_not_found() {
        let manager = TrayManager::new(Arc::new(HeadlessTrays::default()), &EventsConfig::default());
        let id = manager.create().unwrap();
        manager.destroy(id).unwrap();
        assert!(manager.get(id).err().unwrap().is_not_found());
        assert!(manager.get_all().is_empty());
    }

    #[test]
    fn click_kinds_route_to_their_own_slot() {
        let provider = Arc::new(HeadlessTrays::default());
        let manager = TrayManager::new(provider.clone(), &EventsConfig::default());
        let id = manager.create().unwrap();
        let handle = manager.get(id).unwrap().native_handle();
        manager.on_right_clicked(Some(record_right_click));
        manager.start_listening().unwrap();

        provider.simulate_click(handle);
        assert_eq!(LAST_RIGHT_CLICK.load(Ordering::SeqCst), 0);
        provider.simulate_right_click(handle);
        assert_eq!(LAST_RIGHT_CLICK.load(Ordering::SeqCst), id.get());
    }
}
