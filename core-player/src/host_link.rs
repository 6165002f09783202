//! Sender-side logic for the Rendering Host protocol.
//!
//! [`HostLink`] wraps a [`HostChannel`] and enforces the sender half of the
//! wire contract:
//!
//! - `request_id` is a strictly increasing sequence number allocated here.
//! - An identical `(provider, track_id, embed_address)` play tuple is never
//!   re-sent while nothing has changed, so a pure layout change cannot
//!   restart playback.
//! - While the host surface is still loading, instructions are buffered and
//!   flushed exactly once when readiness is signaled. The pending play is
//!   held separately from transport tweaks: only a newer play or a teardown
//!   replaces it, so a volume change cannot evict the track start.
//!
//! [`InstructionGate`] is the receiver-side ordering filter: the host (or an
//! intermediary) applies only instructions whose `request_id` is greater
//! than the last one seen, so a stale, delayed instruction is safely
//! ignored. Out-of-order delivery is resolved here, never by the sender.

use bridge_traits::host::{HostChannel, HostInstruction};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;

/// Fields of a play instruction, minus the sequencing concerns the link owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayParams {
    pub provider: String,
    pub track_id: String,
    pub embed_address: Option<String>,
    pub deep_link_address: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub autoplay: bool,
    pub start_offset_ms: Option<u64>,
}

/// Sender side of the Rendering Host channel.
pub struct HostLink {
    channel: Arc<dyn HostChannel>,
    next_request_id: u64,
    /// Last play tuple actually dispatched or buffered; identical re-sends
    /// are suppressed.
    last_play_key: Option<(String, String, Option<String>)>,
    /// Play instruction held back while the host is still loading. Only a
    /// newer play or a teardown replaces it.
    pending_play: Option<HostInstruction>,
    /// Latest non-play instruction held back while the host is still loading.
    pending_control: Option<HostInstruction>,
}

impl HostLink {
    pub fn new(channel: Arc<dyn HostChannel>) -> Self {
        Self {
            channel,
            next_request_id: 0,
            last_play_key: None,
            pending_play: None,
            pending_control: None,
        }
    }

    /// The transport this link drives.
    pub fn channel(&self) -> Arc<dyn HostChannel> {
        Arc::clone(&self.channel)
    }

    fn allocate_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn host_ready(&self) -> bool {
        *self.channel.readiness().borrow()
    }

    async fn dispatch(&mut self, instruction: HostInstruction) -> Result<()> {
        if self.host_ready() {
            self.channel.send(instruction).await?;
            return Ok(());
        }
        match instruction {
            play @ HostInstruction::Play { .. } => {
                if let Some(previous) = &self.pending_play {
                    debug!(
                        superseded_request_id = previous.request_id(),
                        "Replacing buffered play instruction"
                    );
                }
                self.pending_play = Some(play);
            }
            teardown @ HostInstruction::Teardown { .. } => {
                // Everything buffered before a teardown is moot.
                self.pending_play = None;
                self.pending_control = Some(teardown);
            }
            control => {
                if let Some(previous) = &self.pending_control {
                    debug!(
                        superseded_request_id = previous.request_id(),
                        "Replacing buffered host instruction"
                    );
                }
                self.pending_control = Some(control);
            }
        }
        Ok(())
    }

    /// Send a play instruction, suppressing redundant identical sends.
    ///
    /// Returns `true` when an instruction was actually dispatched (or
    /// buffered), `false` when the send was suppressed.
    pub async fn send_play(&mut self, params: PlayParams) -> Result<bool> {
        let key = (
            params.provider.clone(),
            params.track_id.clone(),
            params.embed_address.clone(),
        );
        if self.last_play_key.as_ref() == Some(&key) {
            debug!(
                provider = %params.provider,
                track_id = %params.track_id,
                "Suppressing redundant play instruction"
            );
            return Ok(false);
        }

        let request_id = self.allocate_request_id();
        self.last_play_key = Some(key);
        self.dispatch(HostInstruction::Play {
            provider: params.provider,
            track_id: params.track_id,
            embed_address: params.embed_address,
            deep_link_address: params.deep_link_address,
            title: params.title,
            artist: params.artist,
            autoplay: params.autoplay,
            start_offset_ms: params.start_offset_ms,
            request_id,
        })
        .await?;
        Ok(true)
    }

    pub async fn pause(&mut self) -> Result<()> {
        let request_id = self.allocate_request_id();
        self.dispatch(HostInstruction::Pause { request_id }).await
    }

    pub async fn resume(&mut self) -> Result<()> {
        let request_id = self.allocate_request_id();
        self.dispatch(HostInstruction::Resume { request_id }).await
    }

    pub async fn seek(&mut self, position_ms: u64) -> Result<()> {
        let request_id = self.allocate_request_id();
        self.dispatch(HostInstruction::Seek {
            position_ms,
            request_id,
        })
        .await
    }

    pub async fn set_volume(&mut self, volume: f32) -> Result<()> {
        let request_id = self.allocate_request_id();
        self.dispatch(HostInstruction::SetVolume {
            volume: volume.clamp(0.0, 1.0),
            request_id,
        })
        .await
    }

    pub async fn set_mute(&mut self, muted: bool) -> Result<()> {
        let request_id = self.allocate_request_id();
        self.dispatch(HostInstruction::SetMute { muted, request_id })
            .await
    }

    /// Release the embedded surface. Clears the play dedup key so the next
    /// request for the same track is sent again.
    pub async fn teardown(&mut self) -> Result<()> {
        self.last_play_key = None;
        let request_id = self.allocate_request_id();
        self.dispatch(HostInstruction::Teardown { request_id }).await
    }

    /// Flush the buffered instructions, if any, in `request_id` order.
    /// Called when host readiness is observed; `Option::take` guarantees
    /// the exactly-once property.
    pub async fn flush_ready(&mut self) -> Result<()> {
        let mut buffered: Vec<HostInstruction> = self
            .pending_play
            .take()
            .into_iter()
            .chain(self.pending_control.take())
            .collect();
        buffered.sort_by_key(|instruction| instruction.request_id());
        for instruction in buffered {
            debug!(
                request_id = instruction.request_id(),
                "Flushing buffered host instruction"
            );
            self.channel.send(instruction).await?;
        }
        Ok(())
    }
}

/// Spawn the background task that flushes buffered instructions when the
/// host signals readiness. Holds only a weak reference, so the task winds
/// down when the link is dropped.
pub fn spawn_flush_task(link: &Arc<Mutex<HostLink>>) -> tokio::task::JoinHandle<()> {
    let weak: Weak<Mutex<HostLink>> = Arc::downgrade(link);
    tokio::spawn(async move {
        let readiness = {
            let Some(link) = weak.upgrade() else { return };
            let guard = link.lock().await;
            guard.channel().readiness()
        };
        // Handle the case where the host was ready before we subscribed.
        if *readiness.borrow() {
            if let Some(link) = weak.upgrade() {
                let result = link.lock().await.flush_ready().await;
                if let Err(error) = result {
                    warn!(%error, "Failed to flush buffered host instruction");
                }
            }
        }
        run_flush_loop(weak, readiness).await;
    })
}

async fn run_flush_loop(
    weak: Weak<Mutex<HostLink>>,
    mut readiness: tokio::sync::watch::Receiver<bool>,
) {
    while readiness.changed().await.is_ok() {
        if !*readiness.borrow() {
            continue;
        }
        let Some(link) = weak.upgrade() else {
            return;
        };
        let result = link.lock().await.flush_ready().await;
        if let Err(error) = result {
            warn!(%error, "Failed to flush buffered host instruction");
        }
    }
}

/// Receiver-side ordering filter for host instructions.
///
/// The effective state after any delivery order equals applying only the
/// instruction with the highest `request_id` seen so far.
#[derive(Debug, Default)]
pub struct InstructionGate {
    last_seen: u64,
}

impl InstructionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `instruction` should be applied. Stale instructions are
    /// discarded silently (logged for diagnostics).
    pub fn admit(&mut self, instruction: &HostInstruction) -> bool {
        let id = instruction.request_id();
        if id <= self.last_seen {
            debug!(
                request_id = id,
                last_seen = self.last_seen,
                "Discarding stale host instruction"
            );
            return false;
        }
        self.last_seen = id;
        true
    }

    /// Highest `request_id` admitted so far.
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }
}
