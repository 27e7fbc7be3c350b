//! Error types for the Standby wait engines and probes.

use thiserror::Error;

/// Result type alias for wait, probe, and config operations.
pub type WaitResult<T> = Result<T, WaitError>;

/// Errors surfaced at the library boundary.
///
/// Probes never report "target not ready" through this type; they return
/// `false`. Only deadline expiry, scan exhaustion, and caller mistakes
/// end up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// The polling deadline passed before the predicate was satisfied.
    #[error("{0}")]
    Timeout(String),

    #[error("no free ports available in {first}..={last}")]
    NoFreePorts { first: u16, last: u16 },

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("config error: {0}")]
    Config(String),
}

impl WaitError {
    /// Whether this is a polling timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout(_))
    }
}
