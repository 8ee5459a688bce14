use std::os::raw::c_char;
use std::path::Path;

use nativeapi_core::NativeApiConfig;
use tracing::{debug, error, info};

use crate::convert::borrowed;
use crate::logging;

/// Create the process context from the config at `config_path`, or from
/// `NATIVEAPI_CONFIG` and defaults when it is null. Does nothing and returns
/// true if a context already exists.
///
/// # Safety
/// `config_path` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn nativeapi_init(config_path: *const c_char) -> bool {
    if crate::is_installed() {
        debug!("nativeapi_init: context already exists");
        return true;
    }
    let config = if config_path.is_null() {
        NativeApiConfig::from_env()
    } else {
        match borrowed("nativeapi_init", config_path) {
            Some(path) => NativeApiConfig::load(Path::new(path)),
            None => {
                logging::init(&Default::default());
                error!("nativeapi_init: config path is not valid UTF-8");
                return false;
            }
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            logging::init(&Default::default());
            error!("nativeapi_init: {err}");
            return false;
        }
    };
    let providers = match crate::default_providers() {
        Ok(providers) => providers,
        Err(err) => {
            logging::init(&config.logging);
            error!("nativeapi_init: no native providers: {err}");
            return false;
        }
    };
    match crate::install(providers, config) {
        Ok(_) => {
            info!("nativeapi initialized");
            true
        }
        Err(err) => {
            error!("nativeapi_init: {err}");
            false
        }
    }
}

/// Stop every notification, drop every callback, close every window and tray
/// icon, then release the context. Ids handed out before stay invalid for the
/// rest of the process; the next context continues their sequence.
#[no_mangle]
pub extern "C" fn nativeapi_shutdown() {
    if !crate::uninstall() {
        debug!("nativeapi_shutdown: no context");
    }
}
