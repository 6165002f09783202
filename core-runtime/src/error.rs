use thiserror::Error;

/// Runtime assembly errors.
///
/// These cover startup wiring only; playback-path failures carry their own
/// taxonomy in the player crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
