//! Provider Capability Table
//!
//! Static classification of providers into embeddable-seekable,
//! embeddable-non-seekable and link-only, plus whether premium-tier device
//! negotiation is required. Every provider has exactly one capability
//! record; unknown providers are treated as link-only.

use crate::types::ProviderKind;

/// Static per-provider capability record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapability {
    /// Whether an embeddable playback surface exists.
    pub embeddable: bool,
    /// Whether the embedded surface honors seek commands.
    pub seekable_in_embed: bool,
    /// Whether full playback requires premium-tier device negotiation.
    pub requires_premium_session: bool,
}

impl ProviderCapability {
    /// Link-only: no embed, outbound deep link is the only action.
    pub const LINK_ONLY: ProviderCapability = ProviderCapability {
        embeddable: false,
        seekable_in_embed: false,
        requires_premium_session: false,
    };
}

/// Look up the capability record for a provider.
pub fn capability_for(provider: &ProviderKind) -> ProviderCapability {
    match provider {
        ProviderKind::YouTube => ProviderCapability {
            embeddable: true,
            seekable_in_embed: true,
            requires_premium_session: false,
        },
        ProviderKind::SoundCloud => ProviderCapability {
            embeddable: true,
            seekable_in_embed: false,
            requires_premium_session: false,
        },
        // Full playback goes through the premium SDK path; the embed is the
        // degraded preview surface.
        ProviderKind::Spotify => ProviderCapability {
            embeddable: true,
            seekable_in_embed: false,
            requires_premium_session: true,
        },
        ProviderKind::AppleMusic => ProviderCapability::LINK_ONLY,
        ProviderKind::Other(_) => ProviderCapability::LINK_ONLY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_is_embeddable_and_seekable() {
        let cap = capability_for(&ProviderKind::YouTube);
        assert!(cap.embeddable);
        assert!(cap.seekable_in_embed);
        assert!(!cap.requires_premium_session);
    }

    #[test]
    fn spotify_requires_premium_session() {
        let cap = capability_for(&ProviderKind::Spotify);
        assert!(cap.requires_premium_session);
        assert!(cap.embeddable);
        assert!(!cap.seekable_in_embed);
    }

    #[test]
    fn unknown_providers_are_link_only() {
        let cap = capability_for(&ProviderKind::Other("bandcamp".to_string()));
        assert_eq!(cap, ProviderCapability::LINK_ONLY);
        assert_eq!(
            capability_for(&ProviderKind::AppleMusic),
            ProviderCapability::LINK_ONLY
        );
    }
}
