use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of outbound calls to the host window or collaborators.
/// Always non-fatal: callers log and move on.
#[derive(Error, Debug)]
pub enum HostError {
    /// The window was torn down while an update was in flight.
    #[error("window is gone")]
    WindowGone,

    /// The platform cannot report or apply this window property.
    #[error("not supported by the platform: {0}")]
    Unsupported(String),

    /// Writing a notification to the host pipe failed.
    #[error("host notification failed: {0}")]
    Notify(#[from] io::Error),

    /// Serializing an outbound command failed.
    #[error("could not encode host command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A host event line that could not be turned into a `HostEvent`.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid {event} payload: {reason}")]
    Invalid {
        event: &'static str,
        reason: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal startup errors surfaced to `main`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
