//! nativeapi core: platform-agnostic resource registry and event bridge behind
//! the C surface.
//!
//! Native resources live in a [`Registry`] under process-unique
//! [`ResourceId`]s. Provider notifications reach external callbacks through an
//! [`EventBridge`] per manager, with payloads marshalled into the records of
//! [`abi`].

pub mod abi;
pub mod accessibility;
pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod id;
pub mod keyboard;
pub mod marshal;
pub mod registry;
pub mod tray;
pub mod window;

pub use accessibility::AccessibilityManager;
pub use bridge::{CallbackSlot, Delivery, Dispatcher, EventBridge};
pub use broadcast::BroadcastCenter;
pub use config::{EventsConfig, LoggingConfig, NativeApiConfig, CONFIG_ENV};
pub use context::NativeApi;
pub use display::DisplayManager;
pub use error::{ConfigError, Error, Result};
pub use id::{ResourceId, ResourceKind};
pub use keyboard::KeyboardMonitor;
pub use registry::Registry;
pub use tray::TrayManager;
pub use window::WindowManager;
