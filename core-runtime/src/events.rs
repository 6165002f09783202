//! # Event Bus System
//!
//! Provides an event-driven architecture for the playback coordinator using
//! `tokio::sync::broadcast`. UI layers (player controls, queue panel, toast
//! notifications) subscribe to typed events instead of polling coordinator
//! state.
//!
//! ## Overview
//!
//! - **Event Types**: strongly-typed enum hierarchies per domain
//! - **EventBus**: central broadcast channel for publishing events
//! - **Subscription Management**: multiple subscribers listen independently
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SessionEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! let event = CoreEvent::Session(SessionEvent::Requesting {
//!     provider: "spotify".to_string(),
//!     track_id: "4uLU6hMCjMI75M1A2tKUQC".to_string(),
//! });
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Error Handling
//!
//! The bus uses `tokio::sync::broadcast`; subscribers handle
//! `RecvError::Lagged(n)` as non-fatal (they missed `n` events and can keep
//! receiving) and treat `RecvError::Closed` as shutdown.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback lifecycle and position events
    Playback(PlaybackEvent),
    /// Session lifecycle events (requesting, activation, degradation)
    Session(SessionEvent),
    /// Presentation and window layout events
    Layout(LayoutEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Layout(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::ProviderUnavailable { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::Degraded { .. }) => EventSeverity::Warning,
            CoreEvent::Session(SessionEvent::Activated { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events describing the active track's playback lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Playback started for a track.
    Started {
        /// Provider family serving the track.
        provider: String,
        /// The track that started playing.
        track_id: String,
    },
    /// Playback paused.
    Paused,
    /// Playback resumed.
    Resumed,
    /// Authoritative position update accepted by the coordinator.
    PositionChanged {
        /// Authoritative position in milliseconds.
        position_ms: u64,
        /// Track duration when known.
        duration_ms: Option<u64>,
    },
    /// The active track played to completion.
    TrackCompleted {
        /// The track that finished.
        track_id: String,
    },
    /// Playback stopped and the session was discarded.
    Stopped,
    /// A playback error was reported by the active provider.
    Error {
        /// Human-readable error message.
        message: String,
        /// Whether playback may resume on the next authoritative update.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused => "Playback paused",
            PlaybackEvent::Resumed => "Playback resumed",
            PlaybackEvent::PositionChanged { .. } => "Playback position updated",
            PlaybackEvent::TrackCompleted { .. } => "Track completed",
            PlaybackEvent::Stopped => "Playback stopped",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Events describing the playback session's lifecycle and capability state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A playback request was accepted and an adapter is being prepared.
    Requesting {
        /// Provider family chosen for the request.
        provider: String,
        /// The requested track.
        track_id: String,
    },
    /// The adapter reported readiness; the session is active.
    Activated {
        /// Provider family serving the session.
        provider: String,
        /// The active track.
        track_id: String,
        /// Whether the seek control should be enabled for this session.
        seekable: bool,
    },
    /// The session fell back to a lower-capability adapter path.
    Degraded {
        /// Provider family that was downgraded.
        provider: String,
        /// User-visible note explaining the downgrade.
        reason: String,
    },
    /// The provider cannot deliver embedded playback at all; the deep link
    /// is the explicit fallback action to surface.
    ProviderUnavailable {
        /// Provider family that is unavailable.
        provider: String,
        /// Outbound destination offered to the user.
        deep_link: String,
        /// Human-readable error message.
        message: String,
    },
    /// Playback is only possible as an outbound deep link for this provider.
    OutboundOnly {
        /// Provider family with no embeddable surface.
        provider: String,
        /// Outbound destination to present as an explicit action.
        deep_link: String,
    },
    /// The user closed the player; the session was discarded.
    Closed,
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Requesting { .. } => "Preparing playback session",
            SessionEvent::Activated { .. } => "Playback session active",
            SessionEvent::Degraded { .. } => "Session degraded to lower-capability path",
            SessionEvent::ProviderUnavailable { .. } => "Provider unavailable",
            SessionEvent::OutboundOnly { .. } => "Provider is link-only",
            SessionEvent::Closed => "Session closed",
        }
    }
}

// ============================================================================
// Layout Events
// ============================================================================

/// Events describing presentation and window layout changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum LayoutEvent {
    /// The player switched presentation (full, compact, mini).
    PresentationChanged {
        /// The new presentation mode name.
        mode: String,
    },
    /// The player entered the cinema (fullscreen overlay) state.
    CinemaEntered,
    /// The player left the cinema state.
    CinemaExited,
    /// Window geometry was persisted to durable storage.
    GeometryPersisted {
        /// The layout mode whose geometry was written.
        mode: String,
    },
}

impl LayoutEvent {
    fn description(&self) -> &str {
        match self {
            LayoutEvent::PresentationChanged { .. } => "Presentation changed",
            LayoutEvent::CinemaEntered => "Entered cinema mode",
            LayoutEvent::CinemaExited => "Exited cinema mode",
            LayoutEvent::GeometryPersisted { .. } => "Layout geometry persisted",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for publishing [`CoreEvent`]s.
///
/// Cloning the bus is cheap; all clones publish into the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_all_subscribers() {
        let bus = EventBus::new(16);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let event = CoreEvent::Playback(PlaybackEvent::Paused);
        let delivered = bus.emit(event.clone()).unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[test]
    fn emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(16);
        assert!(bus
            .emit(CoreEvent::Layout(LayoutEvent::CinemaEntered))
            .is_err());
    }

    #[test]
    fn severity_classification() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            message: "decode failed".to_string(),
            recoverable: true,
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let degraded = CoreEvent::Session(SessionEvent::Degraded {
            provider: "spotify".to_string(),
            reason: "premium required".to_string(),
        });
        assert_eq!(degraded.severity(), EventSeverity::Warning);

        let position = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            position_ms: 100,
            duration_ms: None,
        });
        assert_eq!(position.severity(), EventSeverity::Debug);
    }

    #[test]
    fn events_serialize_with_tags() {
        let event = CoreEvent::Session(SessionEvent::OutboundOnly {
            provider: "applemusic".to_string(),
            deep_link: "https://music.apple.com/song/123".to_string(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Session");
        assert_eq!(json["payload"]["event"], "OutboundOnly");
    }
}
