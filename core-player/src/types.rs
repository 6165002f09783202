//! Core playback domain types.
//!
//! These are the immutable request/metadata shapes exchanged between the
//! coordinator, the provider adapters and UI layers. The mutable aggregate
//! ([`PlaybackSession`]) is owned exclusively by the coordinator; adapters
//! report events and never mutate it directly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported media provider families.
///
/// Unknown providers are carried as [`ProviderKind::Other`] and treated as
/// link-only by the capability table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    YouTube,
    SoundCloud,
    Spotify,
    AppleMusic,
    /// Provider not yet mapped to a dedicated variant.
    Other(String),
}

impl ProviderKind {
    /// Stable lowercase identifier used on the wire and in logs.
    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::YouTube => "youtube",
            ProviderKind::SoundCloud => "soundcloud",
            ProviderKind::Spotify => "spotify",
            ProviderKind::AppleMusic => "applemusic",
            ProviderKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of a playback intent.
///
/// Created whenever the user initiates or switches playback; superseded,
/// never mutated, by the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    /// Provider family to play from.
    pub provider: ProviderKind,
    /// Provider-scoped track identifier (may still carry a URI-scheme
    /// prefix; the resolver normalizes it).
    pub track_id: String,
    /// Optimistic display title, corrected by authoritative metadata.
    pub title: Option<String>,
    /// Optimistic display artist.
    pub artist: Option<String>,
    /// Whether playback should begin immediately on readiness.
    pub autoplay: bool,
    /// Initial playback offset.
    pub start_offset_ms: Option<u64>,
}

impl PlaybackRequest {
    /// Construct a request with autoplay on and no offset.
    pub fn new(provider: ProviderKind, track_id: impl Into<String>) -> Self {
        Self {
            provider,
            track_id: track_id.into(),
            title: None,
            artist: None,
            autoplay: true,
            start_offset_ms: None,
        }
    }

    /// Attach an optimistic display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach an optimistic display artist.
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set whether playback starts automatically.
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Set the initial playback offset.
    pub fn with_start_offset_ms(mut self, offset_ms: u64) -> Self {
        self.start_offset_ms = Some(offset_ms);
        self
    }
}

/// A named, non-overlapping time range within a track's timeline.
///
/// Supplied by the external metadata service, ordered by `start_ms`,
/// read-only to the coordinator. An empty section list is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub label: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Section {
    pub fn new(id: impl Into<String>, label: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            start_ms,
            end_ms,
        }
    }

    /// Whether `position_ms` falls in this section's `[start_ms, end_ms)`.
    pub fn contains(&self, position_ms: u64) -> bool {
        position_ms >= self.start_ms && position_ms < self.end_ms
    }
}

/// One entry of the play queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueTrack {
    pub provider: ProviderKind,
    pub track_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl QueueTrack {
    pub fn new(provider: ProviderKind, track_id: impl Into<String>) -> Self {
        Self {
            provider,
            track_id: track_id.into(),
            title: None,
            artist: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Identity key used when queue contents are reordered or shuffled.
    pub fn identity(&self) -> (&ProviderKind, &str) {
        (&self.provider, &self.track_id)
    }

    /// Turn this entry into a playback request.
    pub fn to_request(&self) -> PlaybackRequest {
        let mut request = PlaybackRequest::new(self.provider.clone(), self.track_id.clone());
        request.title = self.title.clone();
        request.artist = self.artist.clone();
        request
    }
}

/// Partial authoritative status normalized by an adapter.
///
/// Absent fields leave the corresponding session fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritativeStatus {
    pub position_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub is_playing: Option<bool>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// The mutable playback aggregate, owned exclusively by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    /// Unique identifier for this session instance.
    pub session_id: Uuid,
    pub provider: ProviderKind,
    pub track_id: String,
    pub display_title: Option<String>,
    pub display_artist: Option<String>,
    /// Ground-truth position reported by the active adapter.
    pub authoritative_position_ms: u64,
    pub duration_ms: Option<u64>,
    pub is_playing: bool,
    /// Normalized volume in `0.0..=1.0`.
    pub volume: f32,
    pub is_muted: bool,
    pub current_section_id: Option<String>,
    pub loop_section_id: Option<String>,
    /// Whether the seek control is enabled for this session.
    pub seekable: bool,
    /// Whether the session runs on a lower-capability adapter path.
    pub degraded: bool,
    /// User-visible note (e.g. explaining a capability downgrade).
    pub notice: Option<String>,
}

impl PlaybackSession {
    /// Seed a session from a freshly dispatched request.
    pub fn from_request(request: &PlaybackRequest, seekable: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            provider: request.provider.clone(),
            track_id: request.track_id.clone(),
            display_title: request.title.clone(),
            display_artist: request.artist.clone(),
            authoritative_position_ms: request.start_offset_ms.unwrap_or(0),
            duration_ms: None,
            is_playing: false,
            volume: 1.0,
            is_muted: false,
            current_section_id: None,
            loop_section_id: None,
            seekable,
            degraded: false,
            notice: None,
        }
    }

    /// Overwrite fields in place from an authoritative update.
    ///
    /// Maintains the `authoritative_position_ms <= duration_ms` invariant
    /// once the duration is known.
    pub fn apply_status(&mut self, status: &AuthoritativeStatus) {
        if let Some(duration) = status.duration_ms {
            self.duration_ms = Some(duration);
        }
        if let Some(position) = status.position_ms {
            self.authoritative_position_ms = match self.duration_ms {
                Some(duration) => position.min(duration),
                None => position,
            };
        }
        if let Some(playing) = status.is_playing {
            self.is_playing = playing;
        }
        if status.title.is_some() {
            self.display_title = status.title.clone();
        }
        if status.artist.is_some() {
            self.display_artist = status.artist.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_defaults() {
        let request = PlaybackRequest::new(ProviderKind::YouTube, "abc123")
            .with_title("Track")
            .with_start_offset_ms(5_000);

        assert!(request.autoplay);
        assert_eq!(request.start_offset_ms, Some(5_000));
        assert_eq!(request.title.as_deref(), Some("Track"));
        assert!(request.artist.is_none());
    }

    #[test]
    fn section_containment_is_half_open() {
        let section = Section {
            id: "a".to_string(),
            label: "Verse".to_string(),
            start_ms: 0,
            end_ms: 15_000,
        };
        assert!(section.contains(0));
        assert!(section.contains(14_999));
        assert!(!section.contains(15_000));
    }

    #[test]
    fn apply_status_clamps_position_to_duration() {
        let request = PlaybackRequest::new(ProviderKind::SoundCloud, "t1");
        let mut session = PlaybackSession::from_request(&request, true);

        session.apply_status(&AuthoritativeStatus {
            position_ms: Some(200_000),
            duration_ms: Some(180_000),
            is_playing: Some(true),
            ..Default::default()
        });

        assert_eq!(session.authoritative_position_ms, 180_000);
        assert!(session.is_playing);
    }

    #[test]
    fn apply_status_corrects_optimistic_metadata() {
        let request =
            PlaybackRequest::new(ProviderKind::Spotify, "t1").with_title("Guessed Title");
        let mut session = PlaybackSession::from_request(&request, false);

        session.apply_status(&AuthoritativeStatus {
            title: Some("Real Title".to_string()),
            artist: Some("Real Artist".to_string()),
            ..Default::default()
        });

        assert_eq!(session.display_title.as_deref(), Some("Real Title"));
        assert_eq!(session.display_artist.as_deref(), Some("Real Artist"));
    }

    #[test]
    fn provider_kind_display() {
        assert_eq!(ProviderKind::YouTube.to_string(), "youtube");
        assert_eq!(
            ProviderKind::Other("bandcamp".to_string()).to_string(),
            "bandcamp"
        );
    }
}
