//! Rendering Host Protocol
//!
//! The Rendering Host is an isolated, lower-trust surface that performs the
//! actual media decode/render. The coordinator never touches its internals;
//! communication is strictly message-based via [`HostChannel`].
//!
//! ## Ordering law
//!
//! Every instruction carries a strictly increasing `request_id`. The host
//! (and any intermediary) must discard an instruction whose `request_id` is
//! not greater than the last one it has seen, so a stale, delayed
//! "play track A" arriving after a newer "play track B" is safely ignored.
//! Out-of-order delivery is resolved by the receiver, never the sender.
//!
//! ## Readiness
//!
//! While the host surface is still loading, senders buffer the latest
//! instruction and flush it exactly once when [`HostChannel::readiness`]
//! turns true. See `core_player::host_link` for the sender-side logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::error::Result;

/// Instruction sent from the coordinator side to the Rendering Host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum HostInstruction {
    /// Load and (optionally) start playing a track in the embedded surface.
    Play {
        provider: String,
        track_id: String,
        /// Embeddable-surface address; `None` means the host should only
        /// present the outbound deep link.
        embed_address: Option<String>,
        /// Provider-native outbound destination, always present.
        deep_link_address: String,
        title: Option<String>,
        artist: Option<String>,
        autoplay: bool,
        start_offset_ms: Option<u64>,
        request_id: u64,
    },
    Pause {
        request_id: u64,
    },
    Resume {
        request_id: u64,
    },
    Seek {
        position_ms: u64,
        request_id: u64,
    },
    SetVolume {
        volume: f32,
        request_id: u64,
    },
    SetMute {
        muted: bool,
        request_id: u64,
    },
    /// Release the embedded surface and stop any playback.
    Teardown {
        request_id: u64,
    },
}

impl HostInstruction {
    /// The sequence number carried by this instruction.
    pub fn request_id(&self) -> u64 {
        match self {
            HostInstruction::Play { request_id, .. }
            | HostInstruction::Pause { request_id }
            | HostInstruction::Resume { request_id }
            | HostInstruction::Seek { request_id, .. }
            | HostInstruction::SetVolume { request_id, .. }
            | HostInstruction::SetMute { request_id, .. }
            | HostInstruction::Teardown { request_id } => *request_id,
        }
    }
}

/// Status event emitted by the Rendering Host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum HostEvent {
    /// Coarse authoritative playback status, delivered irregularly
    /// (roughly every 0.2-0.5 s while the embed is alive).
    Status {
        position_ms: u64,
        duration_ms: Option<u64>,
        is_playing: bool,
    },
    /// Authoritative track metadata, used to correct optimistic display
    /// fields supplied with the request.
    TrackInfo {
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
    },
    /// The embedded surface reported a playback error.
    PlaybackError {
        message: String,
        /// Fatal errors end the embed session; non-fatal ones are surfaced
        /// as a soft status and playback may resume.
        fatal: bool,
    },
    /// The platform fullscreen state of the embed changed, possibly outside
    /// the application's control.
    FullscreenChanged { active: bool },
    /// The current track played to completion.
    Ended,
}

/// Message transport to the Rendering Host.
///
/// Implementations deliver instructions to the sandboxed surface and fan its
/// status events back out. The channel is the only externally observable
/// wire contract of this subsystem.
#[async_trait]
pub trait HostChannel: Send + Sync {
    /// Deliver an instruction to the host. Callers must only send when the
    /// host is ready (see [`HostChannel::readiness`]); senders that need
    /// buffering layer it on top (see `core_player::host_link::HostLink`).
    async fn send(&self, instruction: HostInstruction) -> Result<()>;

    /// Subscribe to status events emitted by the host.
    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;

    /// Watch the host's readiness. Starts `false` while the surface is
    /// loading and becomes `true` once it can receive instructions.
    fn readiness(&self) -> watch::Receiver<bool>;
}
