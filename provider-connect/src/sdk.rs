//! Native SDK boundary for premium-tier device playback.
//!
//! The real SDK negotiates a playback device tied to the user's premium
//! session and exposes remote transport controls; tests and demos plug in
//! fakes. Everything here is the provider's vocabulary, translated into the
//! uniform adapter contract by [`crate::adapter::ConnectAdapter`].

use async_trait::async_trait;
use thiserror::Error;

/// Identifier of a negotiated playback device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the remote player, polled at a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectPlayerState {
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub is_playing: bool,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// The current track played to completion.
    pub ended: bool,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    /// The account lacks permission for device playback.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Device playback needs a premium subscription.
    #[error("Premium subscription required")]
    PremiumRequired,

    /// The negotiated device disappeared.
    #[error("Playback device not found")]
    DeviceNotFound,

    #[error("Network error: {0}")]
    Network(String),
}

impl ConnectError {
    /// Whether the failure means this capability path is closed to the user
    /// (as opposed to a transient fault).
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            ConnectError::PermissionDenied(_) | ConnectError::PremiumRequired
        )
    }
}

/// Provider SDK surface used by the connect adapter.
#[async_trait]
pub trait ConnectSdk: Send + Sync {
    /// Negotiate a playback device for the given access token.
    async fn negotiate_device(&self, access_token: &str) -> Result<DeviceId, ConnectError>;

    /// Start playing `track_id` on the device, optionally from an offset.
    async fn play(
        &self,
        device: &DeviceId,
        track_id: &str,
        position_ms: Option<u64>,
    ) -> Result<(), ConnectError>;

    async fn pause(&self, device: &DeviceId) -> Result<(), ConnectError>;

    async fn resume(&self, device: &DeviceId) -> Result<(), ConnectError>;

    async fn seek(&self, device: &DeviceId, position_ms: u64) -> Result<(), ConnectError>;

    /// Volume in `[0.0, 1.0]`. The SDK has no separate mute; callers model
    /// mute as volume zero.
    async fn set_volume(&self, device: &DeviceId, volume: f32) -> Result<(), ConnectError>;

    /// Poll the authoritative player state.
    async fn player_state(&self, device: &DeviceId) -> Result<ConnectPlayerState, ConnectError>;

    /// Release the device when the session ends. Best effort.
    async fn release_device(&self, device: &DeviceId) -> Result<(), ConnectError>;
}
