//! Error taxonomy for the generator core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport or API failure talking to the container runtime.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("could not find a network named {0:?}")]
    NetworkNotFound(String),

    /// The runtime is expected to keep network names unique; this is
    /// checked, not assumed.
    #[error("more than one network named {0:?}")]
    AmbiguousNetwork(String),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to send {signal} to {target}: {reason}")]
    Notification {
        signal: String,
        target: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for Error {
    fn from(e: bollard::errors::Error) -> Self {
        Error::RuntimeUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
