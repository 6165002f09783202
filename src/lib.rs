//! Universal media playback coordination.
//!
//! Facade crate assembling the playback core from its workspace parts:
//!
//! - [`core_player`] — coordinator state machine, adapter contract,
//!   embed/link resolution, rendering-host protocol, display smoothing
//! - [`core_layout`] — persisted, viewport-clamped window geometry
//! - [`core_runtime`] — configuration, event bus, logging setup
//! - [`provider_embed`] / [`provider_connect`] — the two adapter families
//! - [`bridge_traits`] — host-implemented boundaries (storage,
//!   credentials, the rendering-host channel, clocks)
//!
//! [`StandardAdapterFactory`] implements the production adapter selection
//! policy, and [`PlayerRuntime::assemble`] wires a full coordinator from a
//! validated [`CoreConfig`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub use bridge_traits;
pub use core_layout;
pub use core_player;
pub use core_runtime;
pub use provider_connect;
pub use provider_embed;

use bridge_traits::clock::{Clock, SystemClock};
use bridge_traits::credentials::CredentialSource;
use core_layout::{LayoutStore, Viewport};
use core_player::adapter::{AdapterFactory, AdapterSink, ProviderAdapter};
use core_player::capability::capability_for;
use core_player::error::{PlayerError, Result};
use core_player::host_link::{spawn_flush_task, HostLink};
use core_player::types::PlaybackRequest;
use core_player::PlaybackCoordinator;
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use provider_connect::{ConnectAdapter, ConnectSdk};
use provider_embed::EmbedAdapter;

/// Production adapter selection policy.
///
/// Premium providers get the native-SDK path on the first attempt and the
/// preview embed on the degraded retry; embeddable providers get the embed
/// path directly. Link-only providers never reach the factory (the
/// coordinator surfaces their deep link instead), so a request for one here
/// is a capability mismatch.
pub struct StandardAdapterFactory {
    host_link: Arc<Mutex<HostLink>>,
    sdk: Arc<dyn ConnectSdk>,
    credentials: Arc<dyn CredentialSource>,
    clock: Arc<dyn Clock>,
    user_id: String,
    poll_interval: std::time::Duration,
    negotiation_timeout: std::time::Duration,
}

#[async_trait]
impl AdapterFactory for StandardAdapterFactory {
    async fn create(
        &self,
        request: &PlaybackRequest,
        degraded: bool,
        sink: AdapterSink,
    ) -> Result<Box<dyn ProviderAdapter>> {
        let capability = capability_for(&request.provider);

        if capability.requires_premium_session && !degraded {
            let adapter = ConnectAdapter::new(
                Arc::clone(&self.sdk),
                Arc::clone(&self.credentials),
                Arc::clone(&self.clock),
                self.user_id.clone(),
                sink,
            )
            .with_poll_interval(self.poll_interval)
            .with_negotiation_timeout(self.negotiation_timeout);
            return Ok(Box::new(adapter));
        }

        if capability.embeddable {
            let seekable = capability.seekable_in_embed && !degraded;
            return Ok(Box::new(EmbedAdapter::new(
                request.provider.clone(),
                seekable,
                Arc::clone(&self.host_link),
                sink,
            )));
        }

        Err(PlayerError::CapabilityMismatch {
            provider: request.provider.to_string(),
            operation: "playback".to_string(),
        })
    }
}

/// A fully wired playback core.
pub struct PlayerRuntime {
    pub coordinator: PlaybackCoordinator,
    pub layout: LayoutStore,
    events: EventBus,
    host_link: Arc<Mutex<HostLink>>,
    flush_task: JoinHandle<()>,
}

impl PlayerRuntime {
    /// Assemble a runtime from a validated configuration.
    ///
    /// `user_id` identifies the user towards the credential manager;
    /// `viewport` is the initial window bounds for layout clamping. Call
    /// [`LayoutStore::load`] afterwards to rehydrate persisted geometry.
    pub fn assemble(
        config: CoreConfig,
        sdk: Arc<dyn ConnectSdk>,
        user_id: impl Into<String>,
        viewport: Viewport,
    ) -> Self {
        let events = EventBus::new(config.event_buffer_size);
        let host_link = Arc::new(Mutex::new(HostLink::new(Arc::clone(&config.host_channel))));
        let flush_task = spawn_flush_task(&host_link);

        let factory = Arc::new(StandardAdapterFactory {
            host_link: Arc::clone(&host_link),
            sdk,
            credentials: Arc::clone(&config.credential_source),
            clock: Arc::new(SystemClock),
            user_id: user_id.into(),
            poll_interval: config.status_poll_interval,
            negotiation_timeout: config.negotiation_timeout,
        });

        let coordinator = PlaybackCoordinator::new(factory, events.clone());
        let layout = LayoutStore::new(Arc::clone(&config.settings_store), events.clone(), viewport);

        Self {
            coordinator,
            layout,
            events,
            host_link,
            flush_task,
        }
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// The shared sender side of the rendering-host channel.
    pub fn host_link(&self) -> Arc<Mutex<HostLink>> {
        Arc::clone(&self.host_link)
    }
}

impl Drop for PlayerRuntime {
    fn drop(&mut self) {
        self.flush_task.abort();
    }
}
