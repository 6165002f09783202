//! Premium-tier adapter driving a provider's native SDK.
//!
//! Setup is the only fallible stretch: acquire a token, negotiate a device
//! within a bounded wait, issue the play command. Every setup failure is
//! reported as a capability downgrade signal so the coordinator retries on
//! the preview-embed path; nothing here ever fails the session outright.
//!
//! Two background tasks run while the session lives: a fixed-interval
//! status poll and a credential refresh timer that fires ahead of token
//! expiry. Both are bound to a [`CancellationToken`] cancelled on teardown.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bridge_traits::clock::Clock;
use bridge_traits::credentials::{AccessToken, CredentialSource};
use core_player::adapter::{AdapterSignal, AdapterSink, ProviderAdapter};
use core_player::error::Result;
use core_player::resolver::normalize_track_id;
use core_player::types::{AuthoritativeStatus, PlaybackRequest, ProviderKind};

use crate::sdk::{ConnectError, ConnectSdk, DeviceId};

/// Bounded wait for device negotiation before falling back.
pub const NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(8);
/// Default authoritative-status poll cadence.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(400);
/// Safety buffer before token expiry at which a refresh is attempted.
pub const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;
/// Floor on the refresh timer so a token already inside the buffer cannot
/// spin the refresh loop against a misbehaving credential source.
const MIN_REFRESH_WAIT: Duration = Duration::from_secs(30);

pub struct ConnectAdapter {
    provider: ProviderKind,
    sdk: Arc<dyn ConnectSdk>,
    credentials: Arc<dyn CredentialSource>,
    clock: Arc<dyn Clock>,
    user_id: String,
    sink: AdapterSink,
    poll_interval: Duration,
    negotiation_timeout: Duration,
    device: Option<DeviceId>,
    volume: f32,
    muted: bool,
    cancel: CancellationToken,
    poll_task: Option<JoinHandle<()>>,
    refresh_task: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl ConnectAdapter {
    pub fn new(
        sdk: Arc<dyn ConnectSdk>,
        credentials: Arc<dyn CredentialSource>,
        clock: Arc<dyn Clock>,
        user_id: impl Into<String>,
        sink: AdapterSink,
    ) -> Self {
        Self {
            provider: ProviderKind::Spotify,
            sdk,
            credentials,
            clock,
            user_id: user_id.into(),
            sink,
            poll_interval: STATUS_POLL_INTERVAL,
            negotiation_timeout: NEGOTIATION_TIMEOUT,
            device: None,
            volume: 1.0,
            muted: false,
            cancel: CancellationToken::new(),
            poll_task: None,
            refresh_task: None,
            torn_down: false,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = timeout;
        self
    }

    fn downgrade(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(provider = %self.provider, %reason, "Falling back from device playback");
        self.sink.emit(AdapterSignal::Downgrade { reason });
    }

    fn spawn_poll(&mut self, device: DeviceId) {
        let sdk = Arc::clone(&self.sdk);
        let sink = self.sink.clone();
        let cancel = self.cancel.clone();
        let interval = self.poll_interval;

        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                match sdk.player_state(&device).await {
                    Ok(state) => {
                        sink.emit(AdapterSignal::Status(AuthoritativeStatus {
                            position_ms: Some(state.position_ms),
                            duration_ms: state.duration_ms,
                            is_playing: Some(state.is_playing),
                            title: state.title,
                            artist: state.artist,
                            album: state.album,
                        }));
                        if state.ended {
                            sink.emit(AdapterSignal::TrackEnded);
                            return;
                        }
                    }
                    Err(error) if error.is_capability_failure() => {
                        sink.emit(AdapterSignal::Downgrade {
                            reason: error.to_string(),
                        });
                        return;
                    }
                    Err(ConnectError::DeviceNotFound) => {
                        sink.emit(AdapterSignal::Error {
                            message: ConnectError::DeviceNotFound.to_string(),
                            fatal: true,
                        });
                        return;
                    }
                    Err(error) => {
                        // Transient; keep polling, playback may recover.
                        sink.emit(AdapterSignal::Error {
                            message: error.to_string(),
                            fatal: false,
                        });
                    }
                }
            }
        }));
    }

    fn spawn_refresh(&mut self, initial: AccessToken) {
        let credentials = Arc::clone(&self.credentials);
        let clock = Arc::clone(&self.clock);
        let user_id = self.user_id.clone();
        let sink = self.sink.clone();
        let cancel = self.cancel.clone();

        self.refresh_task = Some(tokio::spawn(async move {
            let buffer = chrono::Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
            let mut token = initial;
            loop {
                let Some(expires_at) = token.expires_at else {
                    // Nothing to refresh against.
                    return;
                };
                let until_refresh = (expires_at - buffer) - clock.now();
                let wait = until_refresh
                    .to_std()
                    .unwrap_or(Duration::ZERO)
                    .max(MIN_REFRESH_WAIT);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(wait) => {}
                }
                match credentials.get_valid_access_token(&user_id).await {
                    Ok(Some(refreshed)) => {
                        if refreshed.expires_within(buffer, clock.now()) {
                            // The source keeps handing back a dying token;
                            // treat it as unauthenticated.
                            sink.emit(AdapterSignal::Downgrade {
                                reason: "premium session expired".to_string(),
                            });
                            return;
                        }
                        debug!("Premium session token refreshed");
                        token = refreshed;
                    }
                    Ok(None) => {
                        // Refresh failed: unauthenticated, no endless retry.
                        sink.emit(AdapterSignal::Downgrade {
                            reason: "premium session expired".to_string(),
                        });
                        return;
                    }
                    Err(error) => {
                        sink.emit(AdapterSignal::Downgrade {
                            reason: error.to_string(),
                        });
                        return;
                    }
                }
            }
        }));
    }
}

#[async_trait]
impl ProviderAdapter for ConnectAdapter {
    fn provider(&self) -> &ProviderKind {
        &self.provider
    }

    fn supports_seek(&self) -> bool {
        true
    }

    async fn start(&mut self, request: &PlaybackRequest) -> Result<()> {
        let token = match self.credentials.get_valid_access_token(&self.user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.downgrade("no premium session for user");
                return Ok(());
            }
            Err(error) => {
                self.downgrade(error.to_string());
                return Ok(());
            }
        };

        let negotiation =
            tokio::time::timeout(self.negotiation_timeout, self.sdk.negotiate_device(&token.token))
                .await;
        let device = match negotiation {
            Ok(Ok(device)) => device,
            Ok(Err(error)) => {
                self.downgrade(error.to_string());
                return Ok(());
            }
            Err(_) => {
                self.downgrade(format!(
                    "device negotiation timed out after {:?}",
                    self.negotiation_timeout
                ));
                return Ok(());
            }
        };
        info!(device = %device, "Negotiated premium playback device");

        let track_id = normalize_track_id(&self.provider, &request.track_id);
        if let Err(error) = self
            .sdk
            .play(&device, &track_id, request.start_offset_ms)
            .await
        {
            self.downgrade(error.to_string());
            return Ok(());
        }

        self.spawn_poll(device.clone());
        self.spawn_refresh(token);
        self.device = Some(device);
        self.sink.emit(AdapterSignal::Ready);
        Ok(())
    }

    async fn play(&mut self, start_offset_ms: Option<u64>) -> Result<()> {
        let Some(device) = self.device.clone() else {
            debug!("play before device negotiation ignored");
            return Ok(());
        };
        if let Some(offset) = start_offset_ms {
            if let Err(error) = self.sdk.seek(&device, offset).await {
                warn!(%error, "Seek before resume failed");
            }
        }
        if let Err(error) = self.sdk.resume(&device).await {
            self.sink.emit(AdapterSignal::Error {
                message: error.to_string(),
                fatal: false,
            });
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        let Some(device) = self.device.clone() else {
            return Ok(());
        };
        if let Err(error) = self.sdk.pause(&device).await {
            self.sink.emit(AdapterSignal::Error {
                message: error.to_string(),
                fatal: false,
            });
        }
        Ok(())
    }

    async fn seek(&mut self, position_ms: u64) -> Result<()> {
        let Some(device) = self.device.clone() else {
            return Ok(());
        };
        if let Err(error) = self.sdk.seek(&device, position_ms).await {
            self.sink.emit(AdapterSignal::Error {
                message: error.to_string(),
                fatal: false,
            });
        }
        Ok(())
    }

    async fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.volume = volume.clamp(0.0, 1.0);
        if self.muted {
            // Applied when unmuted.
            return Ok(());
        }
        let Some(device) = self.device.clone() else {
            return Ok(());
        };
        if let Err(error) = self.sdk.set_volume(&device, self.volume).await {
            warn!(%error, "Volume change failed");
        }
        Ok(())
    }

    /// The SDK has no separate mute; mute is volume zero with the prior
    /// volume restored on unmute.
    async fn set_mute(&mut self, muted: bool) -> Result<()> {
        self.muted = muted;
        let Some(device) = self.device.clone() else {
            return Ok(());
        };
        let effective = if muted { 0.0 } else { self.volume };
        if let Err(error) = self.sdk.set_volume(&device, effective).await {
            warn!(%error, "Mute change failed");
        }
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.cancel.cancel();
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        if let Some(device) = self.device.take() {
            if let Err(error) = self.sdk.release_device(&device).await {
                warn!(%error, "Device release failed");
            }
        }
        Ok(())
    }
}

impl Drop for ConnectAdapter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
