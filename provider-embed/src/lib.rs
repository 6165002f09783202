//! # Provider: Embedded Surface
//!
//! Adapter for every provider that plays inside the sandboxed rendering
//! surface (YouTube and SoundCloud embeds, and the Spotify preview widget
//! on the degraded path). All control flows through the shared
//! [`core_player::host_link::HostLink`]; host events come back over the
//! channel's broadcast stream and are normalized into adapter signals.

pub mod adapter;

pub use adapter::EmbedAdapter;
