//! Uniform provider adapter contract.
//!
//! One adapter instance exists per active playback session. The adapter
//! translates the coordinator's control calls into provider-specific
//! operations (an embedded surface driven over the host channel, or a
//! native SDK) and reports lifecycle and position events back through an
//! [`AdapterSink`].
//!
//! Every emitted signal carries the generation the adapter was created
//! under. The coordinator bumps its generation counter before tearing an
//! adapter down, so late signals from a replaced adapter compare stale and
//! are discarded rather than corrupting the new session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::Result;
use crate::types::{AuthoritativeStatus, PlaybackRequest, ProviderKind};

/// Normalized event from an adapter to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum AdapterSignal {
    /// The adapter finished setup and can accept control calls.
    Ready,
    /// Partial authoritative state update; unset fields keep their
    /// previous values.
    Status(AuthoritativeStatus),
    /// The current track played to completion.
    TrackEnded,
    /// Provider-reported playback error. Non-fatal errors leave the
    /// session alive; playback may resume on the next status update.
    Error { message: String, fatal: bool },
    /// The adapter cannot continue on its current capability path and the
    /// coordinator should retry on a lower one.
    Downgrade { reason: String },
    /// The rendering surface entered or left platform full-screen.
    FullscreenChanged { active: bool },
}

/// Signal plus the adapter generation that produced it.
#[derive(Debug, Clone)]
pub struct AdapterEnvelope {
    pub generation: u64,
    pub signal: AdapterSignal,
}

/// Handle adapters use to report back to the coordinator.
///
/// Cheap to clone; each clone carries the same generation tag. Sends after
/// the coordinator has dropped its receiver are ignored.
#[derive(Debug, Clone)]
pub struct AdapterSink {
    generation: u64,
    tx: mpsc::UnboundedSender<AdapterEnvelope>,
}

impl AdapterSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<AdapterEnvelope>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, signal: AdapterSignal) {
        trace!(generation = self.generation, ?signal, "Adapter signal");
        let _ = self.tx.send(AdapterEnvelope {
            generation: self.generation,
            signal,
        });
    }
}

/// Uniform playback control surface, implemented per provider family.
///
/// All operations are infallible from the caller's perspective in the sense
/// that errors never propagate past the coordinator: implementations catch
/// provider failures internally and report them as [`AdapterSignal::Error`]
/// or [`AdapterSignal::Downgrade`] instead of returning them where possible.
/// A returned `Err` means the control call itself could not be delivered.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider family this adapter drives.
    fn provider(&self) -> &ProviderKind;

    /// Whether in-place seeking works on this playback path. When false the
    /// coordinator disables the seek control and [`seek`](Self::seek) is a
    /// no-op.
    fn supports_seek(&self) -> bool;

    /// Begin session setup and start playback of the requested track.
    /// Readiness is reported asynchronously via [`AdapterSignal::Ready`].
    async fn start(&mut self, request: &PlaybackRequest) -> Result<()>;

    /// Resume playback, optionally from an explicit offset.
    async fn play(&mut self, start_offset_ms: Option<u64>) -> Result<()>;

    async fn pause(&mut self) -> Result<()>;

    /// Seek to `position_ms`. Must be a no-op on paths that do not support
    /// seeking, never an error.
    async fn seek(&mut self, position_ms: u64) -> Result<()>;

    /// Volume in `[0.0, 1.0]`.
    async fn set_volume(&mut self, volume: f32) -> Result<()>;

    async fn set_mute(&mut self, muted: bool) -> Result<()>;

    /// Release every resource the adapter holds: background polls, timers,
    /// the rendering surface. Must be idempotent and safe to call on an
    /// adapter that never finished initializing.
    async fn teardown(&mut self) -> Result<()>;
}

/// Selects and constructs the adapter for a playback request.
///
/// `degraded` is true when a previous attempt for the same request signaled
/// a capability downgrade; the factory must then return a lower-capability
/// path (or an error if none exists).
#[async_trait]
pub trait AdapterFactory: Send + Sync {
    async fn create(
        &self,
        request: &PlaybackRequest,
        degraded: bool,
        sink: AdapterSink,
    ) -> Result<Box<dyn ProviderAdapter>>;
}
