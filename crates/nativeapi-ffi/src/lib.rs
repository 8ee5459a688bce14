//! C surface of nativeapi.
//!
//! Every exported function resolves the process-wide [`NativeApi`] context,
//! creating it on first use, and converts results into the conventions of the
//! boundary: `0` for a missing id, `false` for a failed operation and null for
//! a missing string. Failures are logged, never propagated as panics.

use std::sync::{Arc, PoisonError, RwLock};

use nativeapi_core::{NativeApi, NativeApiConfig};
use nativeapi_platform::Providers;
use tracing::{info, warn};

pub mod accessibility;
pub mod broadcast;
mod convert;
pub mod display;
pub mod keyboard;
pub mod lifecycle;
pub mod logging;
pub mod memory;
pub mod tray;
pub mod window;

static CONTEXT: RwLock<Option<Arc<NativeApi>>> = RwLock::new(None);

#[cfg(windows)]
fn default_providers() -> nativeapi_platform::Result<Providers> {
    nativeapi_win::providers()
}

#[cfg(not(windows))]
fn default_providers() -> nativeapi_platform::Result<Providers> {
    Ok(nativeapi_platform::headless::HeadlessPlatform::new().providers())
}

/// Replace the process context with one built from `providers`. The previous
/// context, if any, is shut down.
pub fn install(providers: Providers, config: NativeApiConfig) -> nativeapi_core::Result<Arc<NativeApi>> {
    logging::init(&config.logging);
    let api = Arc::new(NativeApi::new(providers, config)?);
    let previous = CONTEXT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(Arc::clone(&api));
    if let Some(previous) = previous {
        previous.shutdown();
    }
    Ok(api)
}

/// Shut down and drop the process context. Returns false if there was none.
pub fn uninstall() -> bool {
    let previous = CONTEXT.write().unwrap_or_else(PoisonError::into_inner).take();
    match previous {
        Some(api) => {
            api.shutdown();
            true
        }
        None => false,
    }
}

pub fn is_installed() -> bool {
    installed().is_some()
}

/// The current context, without creating one.
pub fn installed() -> Option<Arc<NativeApi>> {
    CONTEXT.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// The current context, created from the environment on first use.
pub fn current() -> Option<Arc<NativeApi>> {
    if let Some(api) = installed() {
        return Some(api);
    }
    let mut context = CONTEXT.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(api) = context.as_ref() {
        return Some(Arc::clone(api));
    }
    let config = NativeApiConfig::from_env().unwrap_or_else(|err| {
        logging::init(&Default::default());
        warn!("falling back to default config: {err}");
        NativeApiConfig::default()
    });
    logging::init(&config.logging);
    let created = default_providers()
        .map_err(|err| warn!("no native providers: {err}"))
        .ok()
        .and_then(|providers| {
            NativeApi::new(providers, config)
                .map_err(|err| warn!("failed to create native api context: {err}"))
                .ok()
        })?;
    let api = Arc::new(created);
    *context = Some(Arc::clone(&api));
    info!("native api context created on first use");
    Some(api)
}

/// Run `f` against the current context, or return `fallback` if there is
/// none. The context lock is not held while `f` runs.
pub(crate) fn with_api<T>(fallback: T, f: impl FnOnce(&NativeApi) -> T) -> T {
    match current() {
        Some(api) => f(&api),
        None => fallback,
    }
}

/// Like [`with_api`], but never creates a context. Used by the stop and
/// unregister paths, which have nothing to undo without one.
pub(crate) fn with_installed<T>(fallback: T, f: impl FnOnce(&NativeApi) -> T) -> T {
    match installed() {
        Some(api) => f(&api),
        None => fallback,
    }
}
