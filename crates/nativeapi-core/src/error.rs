use std::path::PathBuf;

use thiserror::Error;

use crate::id::{ResourceId, ResourceKind};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: ResourceId },

    #[error("failed to create {kind}: {source}")]
    ResourceCreation {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    #[error("no current {kind}")]
    NoCurrentResource { kind: ResourceKind },

    #[error("{kind} provider error: {source}")]
    Provider {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    #[error("failed to subscribe to {kind} notifications: {source}")]
    Subscribe {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    /// Only produced while delivering an event; the event is dropped.
    #[error("event dropped while marshalling: {reason}")]
    MarshalSkipped { reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
