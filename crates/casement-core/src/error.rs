//! Error types.

use thiserror::Error;

/// Errors from probing the process-wide window slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Nothing is installed, e.g. during server rendering.
    #[error("no window is installed")]
    NoWindow,
    /// A window is installed but it is not the requested type.
    #[error("installed window is not a `{expected}`")]
    WrongWindowType { expected: &'static str },
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
