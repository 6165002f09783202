//! Embed/Link Resolver
//!
//! Pure, deterministic mapping from `(provider, track_id, options)` to either
//! an embeddable-surface address or a provider-native outbound link. No
//! state, no I/O.
//!
//! Providers hand back ids in inconsistent shapes (bare ids or
//! URI-scheme-prefixed ids like `spotify:track:...`); the resolver strips
//! known prefixes before producing an address. `resolve_embed` returns
//! `None` for providers without an embeddable surface; callers then fall
//! back to the deep link and present it as an explicit outbound action.
//! `resolve_deep_link` never fails: every provider has a canonical outward
//! destination, defaulting to the bare id when no scheme is known.

use crate::capability::capability_for;
use crate::types::ProviderKind;

/// YouTube privacy-enhanced embed base
const YOUTUBE_EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed";
const YOUTUBE_WATCH_BASE: &str = "https://www.youtube.com/watch";
const SOUNDCLOUD_WIDGET_BASE: &str = "https://w.soundcloud.com/player/";
const SOUNDCLOUD_TRACK_BASE: &str = "https://api.soundcloud.com/tracks";
const SPOTIFY_EMBED_BASE: &str = "https://open.spotify.com/embed/track";
const SPOTIFY_TRACK_BASE: &str = "https://open.spotify.com/track";
const APPLE_MUSIC_SONG_BASE: &str = "https://music.apple.com/song";

/// Options influencing embed address construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedOptions {
    pub autoplay: bool,
    pub start_offset_ms: Option<u64>,
}

/// Strip a provider's URI-scheme prefix from a raw track id.
///
/// Ids without a recognized prefix pass through unchanged.
pub fn normalize_track_id(provider: &ProviderKind, raw: &str) -> String {
    let prefixes: &[&str] = match provider {
        ProviderKind::Spotify => &["spotify:track:", "spotify:episode:"],
        ProviderKind::SoundCloud => &["soundcloud:tracks:"],
        ProviderKind::YouTube => &["youtube:video:", "yt:video:"],
        ProviderKind::AppleMusic => &["applemusic:song:"],
        ProviderKind::Other(_) => &[],
    };

    for prefix in prefixes {
        if let Some(stripped) = raw.strip_prefix(prefix) {
            return stripped.to_string();
        }
    }
    raw.to_string()
}

/// Resolve the embeddable-surface address for a track.
///
/// Returns `None` when the provider has no embeddable surface.
pub fn resolve_embed(provider: &ProviderKind, raw_id: &str, options: &EmbedOptions) -> Option<String> {
    if !capability_for(provider).embeddable {
        return None;
    }

    let id = normalize_track_id(provider, raw_id);
    let autoplay_flag = if options.autoplay { 1 } else { 0 };

    match provider {
        ProviderKind::YouTube => {
            let start_secs = options.start_offset_ms.unwrap_or(0) / 1000;
            Some(format!(
                "{YOUTUBE_EMBED_BASE}/{id}?autoplay={autoplay_flag}&start={start_secs}&enablejsapi=1"
            ))
        }
        ProviderKind::SoundCloud => Some(format!(
            "{SOUNDCLOUD_WIDGET_BASE}?url={SOUNDCLOUD_TRACK_BASE}/{id}&auto_play={}",
            options.autoplay
        )),
        // Preview embed; the widget ignores start offsets.
        ProviderKind::Spotify => Some(format!("{SPOTIFY_EMBED_BASE}/{id}")),
        ProviderKind::AppleMusic | ProviderKind::Other(_) => None,
    }
}

/// Resolve the provider-native outbound link for a track. Never fails.
pub fn resolve_deep_link(
    provider: &ProviderKind,
    raw_id: &str,
    start_offset_ms: Option<u64>,
) -> String {
    let id = normalize_track_id(provider, raw_id);

    match provider {
        ProviderKind::YouTube => {
            let mut link = format!("{YOUTUBE_WATCH_BASE}?v={id}");
            if let Some(offset_ms) = start_offset_ms {
                link.push_str(&format!("&t={}s", offset_ms / 1000));
            }
            link
        }
        ProviderKind::SoundCloud => format!("{SOUNDCLOUD_TRACK_BASE}/{id}"),
        ProviderKind::Spotify => format!("{SPOTIFY_TRACK_BASE}/{id}"),
        ProviderKind::AppleMusic => format!("{APPLE_MUSIC_SONG_BASE}/{id}"),
        // No known scheme: hand the bare id back as the destination.
        ProviderKind::Other(_) => id,
    }
}
