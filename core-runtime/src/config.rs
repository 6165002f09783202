//! # Core Configuration Module
//!
//! Provides configuration management for the playback coordinator core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`CoreConfig`] instance holding the host bridges and tunables the
//! coordinator needs. It enforces fail-fast validation so a missing bridge
//! surfaces as a descriptive [`Error::CapabilityMissing`] at startup rather
//! than a panic mid-playback.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - layout geometry persistence
//! - `CredentialSource` - premium-provider access tokens
//! - `HostChannel` - message transport to the Rendering Host
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .settings_store(store)
//!     .credential_source(credentials)
//!     .host_channel(channel)
//!     .build()?;
//! ```

use bridge_traits::{CredentialSource, HostChannel, SettingsStore};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default authoritative-status poll interval for polling adapters.
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Default bound on premium device negotiation.
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(8);

/// Assembled configuration for the coordinator core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Durable key-value storage for layout geometry.
    pub settings_store: Arc<dyn SettingsStore>,
    /// External credential/session manager for premium providers.
    pub credential_source: Arc<dyn CredentialSource>,
    /// Message transport to the Rendering Host.
    pub host_channel: Arc<dyn HostChannel>,
    /// Event bus buffer size.
    pub event_buffer_size: usize,
    /// Fixed interval between authoritative-status polls.
    pub status_poll_interval: Duration,
    /// Bound on premium device negotiation before falling back.
    pub negotiation_timeout: Duration,
}

impl CoreConfig {
    /// Start building a configuration.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`] with fail-fast validation.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings_store: Option<Arc<dyn SettingsStore>>,
    credential_source: Option<Arc<dyn CredentialSource>>,
    host_channel: Option<Arc<dyn HostChannel>>,
    event_buffer_size: Option<usize>,
    status_poll_interval: Option<Duration>,
    negotiation_timeout: Option<Duration>,
}

impl CoreConfigBuilder {
    /// Provide the settings store bridge.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Provide the credential source bridge.
    pub fn credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credential_source = Some(source);
        self
    }

    /// Provide the Rendering Host channel bridge.
    pub fn host_channel(mut self, channel: Arc<dyn HostChannel>) -> Self {
        self.host_channel = Some(channel);
        self
    }

    /// Override the event bus buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Override the authoritative-status poll interval.
    pub fn status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = Some(interval);
        self
    }

    /// Override the premium device negotiation timeout.
    pub fn negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = Some(timeout);
        self
    }

    /// Validate and assemble the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when a required bridge was not
    /// provided, naming the missing capability.
    pub fn build(self) -> Result<CoreConfig> {
        let settings_store = self.settings_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "SettingsStore".to_string(),
            message: "No settings store provided. Layout geometry cannot be persisted \
                      without one; inject a platform-backed implementation."
                .to_string(),
        })?;

        let credential_source =
            self.credential_source
                .ok_or_else(|| Error::CapabilityMissing {
                    capability: "CredentialSource".to_string(),
                    message: "No credential source provided. Premium providers require \
                              an external credential/session manager."
                        .to_string(),
                })?;

        let host_channel = self.host_channel.ok_or_else(|| Error::CapabilityMissing {
            capability: "HostChannel".to_string(),
            message: "No Rendering Host channel provided. Embedded playback is \
                      impossible without the host message transport."
                .to_string(),
        })?;

        Ok(CoreConfig {
            settings_store,
            credential_source,
            host_channel,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            status_poll_interval: self
                .status_poll_interval
                .unwrap_or(DEFAULT_STATUS_POLL_INTERVAL),
            negotiation_timeout: self
                .negotiation_timeout
                .unwrap_or(DEFAULT_NEGOTIATION_TIMEOUT),
        })
    }
}
