//! Adapter for providers that play inside the embedded rendering surface.
//!
//! One instance drives one embed session over the shared [`HostLink`]. The
//! adapter owns a listener task that normalizes host events into adapter
//! signals; the task is bound to a [`CancellationToken`] cancelled on
//! teardown so no event can reach a discarded session.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use bridge_traits::host::HostEvent;
use core_player::adapter::{AdapterSignal, AdapterSink, ProviderAdapter};
use core_player::error::{PlayerError, Result};
use core_player::host_link::{HostLink, PlayParams};
use core_player::resolver::{resolve_deep_link, resolve_embed, EmbedOptions};
use core_player::types::{AuthoritativeStatus, PlaybackRequest, ProviderKind};

pub struct EmbedAdapter {
    provider: ProviderKind,
    seekable: bool,
    host_link: Arc<Mutex<HostLink>>,
    sink: AdapterSink,
    cancel: CancellationToken,
    listener: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl EmbedAdapter {
    pub fn new(
        provider: ProviderKind,
        seekable: bool,
        host_link: Arc<Mutex<HostLink>>,
        sink: AdapterSink,
    ) -> Self {
        Self {
            provider,
            seekable,
            host_link,
            sink,
            cancel: CancellationToken::new(),
            listener: None,
            torn_down: false,
        }
    }

    fn spawn_listener(&mut self, channel: Arc<dyn bridge_traits::host::HostChannel>) {
        let sink = self.sink.clone();
        let cancel = self.cancel.clone();
        let mut events = channel.subscribe();
        let mut readiness = channel.readiness();

        self.listener = Some(tokio::spawn(async move {
            // Readiness first: the session only becomes active once the
            // surface can receive instructions.
            loop {
                if *readiness.borrow() {
                    sink.emit(AdapterSignal::Ready);
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = readiness.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    event = events.recv() => match event {
                        Ok(event) => forward(&sink, event),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Embed listener lagged behind host events");
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        }));
    }
}

/// Normalize one host event into an adapter signal.
fn forward(sink: &AdapterSink, event: HostEvent) {
    match event {
        HostEvent::Status {
            position_ms,
            duration_ms,
            is_playing,
        } => sink.emit(AdapterSignal::Status(AuthoritativeStatus {
            position_ms: Some(position_ms),
            duration_ms,
            is_playing: Some(is_playing),
            ..Default::default()
        })),
        HostEvent::TrackInfo {
            title,
            artist,
            album,
        } => sink.emit(AdapterSignal::Status(AuthoritativeStatus {
            title,
            artist,
            album,
            ..Default::default()
        })),
        HostEvent::PlaybackError { message, fatal } => {
            sink.emit(AdapterSignal::Error { message, fatal })
        }
        HostEvent::FullscreenChanged { active } => {
            sink.emit(AdapterSignal::FullscreenChanged { active })
        }
        HostEvent::Ended => sink.emit(AdapterSignal::TrackEnded),
    }
}

#[async_trait]
impl ProviderAdapter for EmbedAdapter {
    fn provider(&self) -> &ProviderKind {
        &self.provider
    }

    fn supports_seek(&self) -> bool {
        self.seekable
    }

    async fn start(&mut self, request: &PlaybackRequest) -> Result<()> {
        let options = EmbedOptions {
            autoplay: request.autoplay,
            start_offset_ms: request.start_offset_ms,
        };
        let embed_address = resolve_embed(&self.provider, &request.track_id, &options);
        if embed_address.is_none() {
            return Err(PlayerError::CapabilityMismatch {
                provider: self.provider.to_string(),
                operation: "embed".to_string(),
            });
        }
        let deep_link_address =
            resolve_deep_link(&self.provider, &request.track_id, request.start_offset_ms);

        let channel = {
            let link = self.host_link.lock().await;
            link.channel()
        };
        self.spawn_listener(channel);

        self.host_link
            .lock()
            .await
            .send_play(PlayParams {
                provider: self.provider.as_str().to_string(),
                track_id: request.track_id.clone(),
                embed_address,
                deep_link_address,
                title: request.title.clone(),
                artist: request.artist.clone(),
                autoplay: request.autoplay,
                start_offset_ms: request.start_offset_ms,
            })
            .await?;
        Ok(())
    }

    async fn play(&mut self, start_offset_ms: Option<u64>) -> Result<()> {
        let mut link = self.host_link.lock().await;
        if let Some(offset) = start_offset_ms {
            if self.seekable {
                link.seek(offset).await?;
            }
        }
        link.resume().await
    }

    async fn pause(&mut self) -> Result<()> {
        self.host_link.lock().await.pause().await
    }

    async fn seek(&mut self, position_ms: u64) -> Result<()> {
        if !self.seekable {
            debug!(provider = %self.provider, "Seek ignored, embed is not seekable");
            return Ok(());
        }
        self.host_link.lock().await.seek(position_ms).await
    }

    async fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.host_link.lock().await.set_volume(volume).await
    }

    async fn set_mute(&mut self, muted: bool) -> Result<()> {
        self.host_link.lock().await.set_mute(muted).await
    }

    async fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.cancel.cancel();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.host_link.lock().await.teardown().await
    }
}

impl Drop for EmbedAdapter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
