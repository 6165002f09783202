//! # Core Player
//!
//! The playback heart of the system: provider capability classification,
//! embed/deep-link resolution, the uniform provider adapter contract, the
//! rendering-host wire protocol, and the coordinator state machine that
//! owns the playback session, queue, section looping and position
//! smoothing.
//!
//! ## Architecture
//!
//! ```text
//! UI controls ──> PlaybackCoordinator ──> AdapterFactory ──> ProviderAdapter
//!                      │    ▲                                     │
//!                      │    └──── AdapterSink (generation-tagged) ┘
//!                      │
//!                      ├──> SeekDisplayAnimator (display position)
//!                      ├──> PlayQueue / LoopController
//!                      └──> HostLink ──> Rendering Host (message channel)
//! ```
//!
//! Adapters never mutate coordinator state; they emit signals and the
//! coordinator decides. The rendering host is a remote actor reachable
//! only through the ordered, idempotent instruction channel in
//! [`host_link`].

pub mod adapter;
pub mod animator;
pub mod capability;
pub mod coordinator;
pub mod error;
pub mod host_link;
pub mod queue;
pub mod resolver;
pub mod sections;
pub mod types;

pub use adapter::{AdapterEnvelope, AdapterFactory, AdapterSignal, AdapterSink, ProviderAdapter};
pub use animator::{SeekDisplayAnimator, SNAP_THRESHOLD_MS};
pub use capability::{capability_for, ProviderCapability};
pub use coordinator::{
    CoordinatorState, PlaybackCoordinator, Presentation, PREVIOUS_RESTART_THRESHOLD_MS,
};
pub use error::{PlayerError, Result};
pub use host_link::{spawn_flush_task, HostLink, InstructionGate, PlayParams};
pub use queue::PlayQueue;
pub use resolver::{normalize_track_id, resolve_deep_link, resolve_embed, EmbedOptions};
pub use sections::{
    section_at, LoopController, LOOP_BOUNDARY_THRESHOLD_MS, LOOP_SEEK_COOLDOWN_MS,
};
pub use types::{
    AuthoritativeStatus, PlaybackRequest, PlaybackSession, ProviderKind, QueueTrack, Section,
};
