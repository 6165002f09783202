//! # Host Bridge Traits
//!
//! Abstractions the playback coordinator consumes but does not own.
//!
//! ## Overview
//!
//! This crate defines the contract between the coordinator core and its
//! external collaborators. Each trait represents a boundary that the host
//! application (or a test harness) must implement:
//!
//! - [`HostChannel`](host::HostChannel) - message transport to the sandboxed
//!   Rendering Host, together with the typed wire protocol
//!   ([`HostInstruction`](host::HostInstruction) / [`HostEvent`](host::HostEvent))
//! - [`CredentialSource`](credentials::CredentialSource) - the external
//!   credential/session manager supplying valid access tokens for premium
//!   providers
//! - [`SettingsStore`](storage::SettingsStore) - durable key-value storage
//!   used for layout geometry persistence
//! - [`Clock`](clock::Clock) - injectable time source for deterministic tests
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing; see `core-runtime`'s configuration module. Bridge implementations
//! should convert platform-specific failures into [`BridgeError`] with
//! actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared across async tasks behind `Arc`.

pub mod clock;
pub mod credentials;
pub mod error;
pub mod host;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{AccessToken, CredentialSource, StaticCredentialSource};
pub use host::{HostChannel, HostEvent, HostInstruction};
pub use storage::{MemorySettingsStore, SettingsStore};
