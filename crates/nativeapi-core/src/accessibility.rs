use std::sync::Arc;

use nativeapi_platform::AccessibilityProvider;
use tracing::debug;

use crate::error::{Error, Result};
use crate::id::ResourceKind;

pub struct AccessibilityManager {
    provider: Arc<dyn AccessibilityProvider>,
}

impl AccessibilityManager {
    pub fn new(provider: Arc<dyn AccessibilityProvider>) -> Self {
        Self { provider }
    }

    /// Turn on the accessibility tree. Enabling twice is harmless.
    pub fn enable(&self) -> Result<()> {
        self.provider.enable().map_err(|source| Error::Provider {
            kind: ResourceKind::Accessibility,
            source,
        })?;
        debug!("accessibility enabled");
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_enabled()
    }
}
