//! Error types for session operations.

use rakdev_at_protocol::CommandError;
use thiserror::Error;

use crate::SessionState;

/// Errors returned by [`Session`](crate::Session) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation is not allowed in the current state.
    #[error("{operation} is not permitted while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Transmit refused because the device has not joined.
    #[error("cannot transmit while {state}, the device has not joined")]
    NotJoined { state: SessionState },

    /// A bring-up step failed; the remaining steps were not attempted.
    #[error("setup failed at {step}: {source}")]
    Setup {
        step: &'static str,
        #[source]
        source: CommandError,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type alias for session operations.
pub type SessionResult<T = ()> = Result<T, SessionError>;
