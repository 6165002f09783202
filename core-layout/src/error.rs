//! Layout error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors from geometry persistence.
///
/// All of these are non-fatal to callers: a failed write simply means the
/// layout does not survive a reload.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Storage error: {0}")]
    Storage(#[from] bridge_traits::error::BridgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
