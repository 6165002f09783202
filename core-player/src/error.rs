//! # Player Error Types
//!
//! Error taxonomy for the playback coordinator. Adapter-level failures are
//! always caught at the adapter boundary and translated into coordinator
//! state (a downgrade, a user-visible note, or a surfaced deep link); these
//! variants exist for the call paths that legitimately return `Err` to the
//! caller, never for crashing the UI.

use thiserror::Error;

/// Errors that can occur during playback coordination.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// A requested operation is unsupported by the active provider.
    #[error("Operation not supported by provider {provider}: {operation}")]
    CapabilityMismatch { provider: String, operation: String },

    /// Missing, expired or invalid credential for a premium provider.
    #[error("Provider authentication failed: {0}")]
    Authentication(String),

    /// Provider device/session setup exceeded its bound.
    #[error("Device negotiation timed out after {0:?}")]
    NegotiationTimeout(std::time::Duration),

    /// Decode/network hiccup reported by a provider; non-fatal.
    #[error("Transient playback error: {0}")]
    Transient(String),

    /// Out-of-order or malformed Rendering Host message.
    #[error("Rendering host protocol violation: {0}")]
    ProtocolViolation(String),

    /// Queue operation referenced an index outside the queue.
    #[error("Queue index out of bounds: {index} (queue length {len})")]
    QueueIndexOutOfBounds { index: usize, len: usize },

    /// An operation required an active session and none exists.
    #[error("No active playback session")]
    NoActiveSession,

    /// Failure crossing a host bridge boundary.
    #[error(transparent)]
    Bridge(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
