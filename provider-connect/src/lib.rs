//! # Provider: Premium Device Playback
//!
//! Adapter for premium-tier providers whose playback runs through a native
//! SDK instead of the embedded surface. Covers token acquisition with
//! refresh ahead of expiry, bounded device negotiation, fixed-interval
//! status polling, and graceful capability downgrade when any of those
//! fail.

pub mod adapter;
pub mod sdk;

pub use adapter::{
    ConnectAdapter, NEGOTIATION_TIMEOUT, STATUS_POLL_INTERVAL, TOKEN_REFRESH_BUFFER_MINUTES,
};
pub use sdk::{ConnectError, ConnectPlayerState, ConnectSdk, DeviceId};
