//! Persistent window geometry store.
//!
//! Tracks position and scale independently for the main, compact and mini
//! presentations. State lives in memory behind a `parking_lot` lock
//! (mutation is UI-driven and single-threaded); every change is written
//! through the injected [`SettingsStore`] and read back once at startup.
//! Rehydrated positions are clamped against the *current* viewport, since
//! it may have changed size since the last session.
//!
//! Persistence failures are logged and swallowed. Playback events never
//! touch this store; geometry and playback are fully decoupled.

use std::sync::Arc;

use bridge_traits::storage::SettingsStore;
use core_runtime::events::{CoreEvent, EventBus, LayoutEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{clamp_position, snap_to_corner, Point, Size, Viewport, VIEWPORT_MARGIN};

/// Storage key for the scale/compact record.
pub const SCALE_PREFS_KEY: &str = "player.scale_prefs";
/// Storage key for the per-mode window positions.
pub const POSITIONS_KEY: &str = "player.window_positions";

/// Window layout presentation, mirroring the player's presentation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Main,
    Compact,
    Mini,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Main => "main",
            LayoutMode::Compact => "compact",
            LayoutMode::Mini => "mini",
        }
    }
}

/// Persisted scale selections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalePrefs {
    pub is_compact: bool,
    pub video_scale: f64,
    pub player_scale: f64,
}

impl Default for ScalePrefs {
    fn default() -> Self {
        Self {
            is_compact: false,
            video_scale: 1.0,
            player_scale: 1.0,
        }
    }
}

/// Persisted per-mode positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub main: Point,
    pub compact: Point,
    pub mini: Point,
}

impl Default for PositionRecord {
    fn default() -> Self {
        let origin = Point::new(VIEWPORT_MARGIN, VIEWPORT_MARGIN);
        Self {
            main: origin,
            compact: origin,
            mini: origin,
        }
    }
}

impl PositionRecord {
    fn get(&self, mode: LayoutMode) -> Point {
        match mode {
            LayoutMode::Main => self.main,
            LayoutMode::Compact => self.compact,
            LayoutMode::Mini => self.mini,
        }
    }

    fn set(&mut self, mode: LayoutMode, position: Point) {
        match mode {
            LayoutMode::Main => self.main = position,
            LayoutMode::Compact => self.compact = position,
            LayoutMode::Mini => self.mini = position,
        }
    }
}

/// Bounding-box sizes used for clamping, one per mode.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ElementSizes {
    main: Size,
    compact: Size,
    mini: Size,
}

impl Default for ElementSizes {
    fn default() -> Self {
        Self {
            main: Size::new(960.0, 540.0),
            compact: Size::new(400.0, 225.0),
            mini: Size::new(280.0, 72.0),
        }
    }
}

impl ElementSizes {
    fn get(&self, mode: LayoutMode) -> Size {
        match mode {
            LayoutMode::Main => self.main,
            LayoutMode::Compact => self.compact,
            LayoutMode::Mini => self.mini,
        }
    }

    fn set(&mut self, mode: LayoutMode, size: Size) {
        match mode {
            LayoutMode::Main => self.main = size,
            LayoutMode::Compact => self.compact = size,
            LayoutMode::Mini => self.mini = size,
        }
    }
}

#[derive(Debug, Default)]
struct LayoutState {
    positions: PositionRecord,
    scale: ScalePrefs,
    sizes: ElementSizes,
}

pub struct LayoutStore {
    settings: Arc<dyn SettingsStore>,
    events: EventBus,
    state: RwLock<LayoutState>,
    viewport: RwLock<Viewport>,
}

impl LayoutStore {
    pub fn new(settings: Arc<dyn SettingsStore>, events: EventBus, viewport: Viewport) -> Self {
        Self {
            settings,
            events,
            state: RwLock::new(LayoutState::default()),
            viewport: RwLock::new(viewport),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn position(&self, mode: LayoutMode) -> Point {
        self.state.read().positions.get(mode)
    }

    pub fn scale_prefs(&self) -> ScalePrefs {
        self.state.read().scale
    }

    pub fn viewport(&self) -> Viewport {
        *self.viewport.read()
    }

    /// Update the bounding-box size used for clamping in `mode`, re-clamping
    /// the stored position against it.
    pub fn set_element_size(&self, mode: LayoutMode, size: Size) {
        let viewport = *self.viewport.read();
        let mut state = self.state.write();
        state.sizes.set(mode, size);
        let clamped = clamp_position(state.positions.get(mode), size, viewport);
        state.positions.set(mode, clamped);
    }

    /// The viewport changed (window resize, display change): re-clamp every
    /// stored position against the new bounds.
    pub fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.write() = viewport;
        let mut state = self.state.write();
        for mode in [LayoutMode::Main, LayoutMode::Compact, LayoutMode::Mini] {
            let clamped = clamp_position(state.positions.get(mode), state.sizes.get(mode), viewport);
            state.positions.set(mode, clamped);
        }
    }

    // ------------------------------------------------------------------
    // Drag handling
    // ------------------------------------------------------------------

    /// Apply an in-progress drag delta to `mode`'s position, clamped to the
    /// viewport. Does not persist; call [`end_drag`](Self::end_drag) when
    /// the gesture completes.
    pub fn apply_drag(&self, mode: LayoutMode, dx: f64, dy: f64) -> Point {
        let viewport = *self.viewport.read();
        let mut state = self.state.write();
        let size = state.sizes.get(mode);
        let moved = state.positions.get(mode).offset(dx, dy);
        let clamped = clamp_position(moved, size, viewport);
        state.positions.set(mode, clamped);
        clamped
    }

    /// Finish a drag gesture: compact windows snap to the nearest viewport
    /// corner; the result is persisted.
    pub async fn end_drag(&self, mode: LayoutMode) -> Point {
        let settled = {
            let viewport = *self.viewport.read();
            let mut state = self.state.write();
            let size = state.sizes.get(mode);
            let current = state.positions.get(mode);
            let settled = if mode == LayoutMode::Compact {
                snap_to_corner(current, size, viewport)
            } else {
                current
            };
            state.positions.set(mode, settled);
            settled
        };
        self.persist_positions(mode).await;
        settled
    }

    /// Place `mode`'s window at an absolute position (clamped) and persist.
    pub async fn set_position(&self, mode: LayoutMode, position: Point) -> Point {
        let clamped = {
            let viewport = *self.viewport.read();
            let mut state = self.state.write();
            let clamped = clamp_position(position, state.sizes.get(mode), viewport);
            state.positions.set(mode, clamped);
            clamped
        };
        self.persist_positions(mode).await;
        clamped
    }

    // ------------------------------------------------------------------
    // Scale preferences
    // ------------------------------------------------------------------

    pub async fn set_scale_prefs(&self, prefs: ScalePrefs) {
        self.state.write().scale = prefs;
        self.persist_scale().await;
    }

    pub async fn set_video_scale(&self, scale: f64) {
        self.state.write().scale.video_scale = scale;
        self.persist_scale().await;
    }

    pub async fn set_player_scale(&self, scale: f64) {
        self.state.write().scale.player_scale = scale;
        self.persist_scale().await;
    }

    pub async fn set_compact(&self, is_compact: bool) {
        self.state.write().scale.is_compact = is_compact;
        self.persist_scale().await;
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Read both records back from storage, clamping rehydrated positions
    /// against the current viewport. Missing or unreadable records fall
    /// back to defaults; this is a normal first-run outcome.
    pub async fn load(&self) -> Result<()> {
        if let Some(raw) = self.settings.get_string(POSITIONS_KEY).await? {
            match serde_json::from_str::<PositionRecord>(&raw) {
                Ok(record) => {
                    let viewport = *self.viewport.read();
                    let mut state = self.state.write();
                    for mode in [LayoutMode::Main, LayoutMode::Compact, LayoutMode::Mini] {
                        let clamped =
                            clamp_position(record.get(mode), state.sizes.get(mode), viewport);
                        state.positions.set(mode, clamped);
                    }
                }
                Err(error) => {
                    warn!(%error, "Discarding unreadable window position record");
                }
            }
        }

        if let Some(raw) = self.settings.get_string(SCALE_PREFS_KEY).await? {
            match serde_json::from_str::<ScalePrefs>(&raw) {
                Ok(prefs) => self.state.write().scale = prefs,
                Err(error) => {
                    warn!(%error, "Discarding unreadable scale preference record");
                }
            }
        }

        debug!("Layout state rehydrated");
        Ok(())
    }

    async fn persist_positions(&self, mode: LayoutMode) {
        let payload = {
            let state = self.state.read();
            serde_json::to_string(&state.positions)
        };
        match payload {
            Ok(json) => {
                if let Err(error) = self.settings.set_string(POSITIONS_KEY, &json).await {
                    warn!(%error, "Failed to persist window positions");
                    return;
                }
                let _ = self.events.emit(CoreEvent::Layout(LayoutEvent::GeometryPersisted {
                    mode: mode.as_str().to_string(),
                }));
            }
            Err(error) => warn!(%error, "Failed to serialize window positions"),
        }
    }

    async fn persist_scale(&self) {
        let payload = {
            let state = self.state.read();
            serde_json::to_string(&state.scale)
        };
        match payload {
            Ok(json) => {
                if let Err(error) = self.settings.set_string(SCALE_PREFS_KEY, &json).await {
                    warn!(%error, "Failed to persist scale preferences");
                }
            }
            Err(error) => warn!(%error, "Failed to serialize scale preferences"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::storage::MemorySettingsStore;

    fn store_with(viewport: Viewport) -> (LayoutStore, Arc<MemorySettingsStore>) {
        let settings = Arc::new(MemorySettingsStore::new());
        let store = LayoutStore::new(settings.clone(), EventBus::new(16), viewport);
        (store, settings)
    }

    fn viewport() -> Viewport {
        Viewport::new(1920.0, 1080.0)
    }

    #[tokio::test]
    async fn drag_stays_within_viewport() {
        let (store, _) = store_with(viewport());
        store.set_element_size(LayoutMode::Main, Size::new(320.0, 180.0));

        let position = store.apply_drag(LayoutMode::Main, 1e6, 1e6);
        assert_eq!(position, Point::new(1920.0 - 320.0 - 16.0, 1080.0 - 180.0 - 16.0));

        let position = store.apply_drag(LayoutMode::Main, -1e9, -1e9);
        assert_eq!(position, Point::new(VIEWPORT_MARGIN, VIEWPORT_MARGIN));
    }

    #[tokio::test]
    async fn compact_drag_end_snaps_to_a_corner() {
        let (store, _) = store_with(viewport());
        store.set_element_size(LayoutMode::Compact, Size::new(400.0, 225.0));

        store.apply_drag(LayoutMode::Compact, 1_300.0, 100.0);
        let settled = store.end_drag(LayoutMode::Compact).await;
        assert_eq!(settled, Point::new(1920.0 - 400.0 - 16.0, VIEWPORT_MARGIN));
    }

    #[tokio::test]
    async fn main_drag_end_does_not_snap() {
        let (store, _) = store_with(viewport());
        store.apply_drag(LayoutMode::Main, 500.0, 300.0);
        let before = store.position(LayoutMode::Main);
        let settled = store.end_drag(LayoutMode::Main).await;
        assert_eq!(settled, before);
    }

    #[tokio::test]
    async fn geometry_round_trips_through_storage() {
        let (store, settings) = store_with(viewport());
        store.set_position(LayoutMode::Mini, Point::new(700.0, 500.0)).await;
        store
            .set_scale_prefs(ScalePrefs {
                is_compact: true,
                video_scale: 1.5,
                player_scale: 0.8,
            })
            .await;

        // A fresh store over the same backing storage sees the same state.
        let rehydrated = LayoutStore::new(settings, EventBus::new(16), viewport());
        rehydrated.load().await.unwrap();
        assert_eq!(rehydrated.position(LayoutMode::Mini), Point::new(700.0, 500.0));
        assert_eq!(
            rehydrated.scale_prefs(),
            ScalePrefs {
                is_compact: true,
                video_scale: 1.5,
                player_scale: 0.8,
            }
        );
    }

    #[tokio::test]
    async fn rehydrating_into_a_smaller_viewport_clamps() {
        let (store, settings) = store_with(viewport());
        store
            .set_position(LayoutMode::Main, Point::new(1_500.0, 800.0))
            .await;

        let small = Viewport::new(800.0, 600.0);
        let rehydrated = LayoutStore::new(settings, EventBus::new(16), small);
        rehydrated.set_element_size(LayoutMode::Main, Size::new(320.0, 180.0));
        rehydrated.load().await.unwrap();

        let position = rehydrated.position(LayoutMode::Main);
        assert_eq!(position, Point::new(800.0 - 320.0 - 16.0, 600.0 - 180.0 - 16.0));
    }

    #[tokio::test]
    async fn viewport_shrink_reclamps_stored_positions() {
        let (store, _) = store_with(viewport());
        store.set_element_size(LayoutMode::Mini, Size::new(280.0, 72.0));
        store
            .set_position(LayoutMode::Mini, Point::new(1_600.0, 900.0))
            .await;

        store.set_viewport(Viewport::new(1024.0, 768.0));
        let position = store.position(LayoutMode::Mini);
        assert!(position.x + 280.0 + VIEWPORT_MARGIN <= 1024.0);
        assert!(position.y + 72.0 + VIEWPORT_MARGIN <= 768.0);
    }

    #[tokio::test]
    async fn unreadable_records_fall_back_to_defaults() {
        let (store, settings) = store_with(viewport());
        settings
            .set_string(POSITIONS_KEY, "not json")
            .await
            .unwrap();
        store.load().await.unwrap();
        assert_eq!(
            store.position(LayoutMode::Main),
            Point::new(VIEWPORT_MARGIN, VIEWPORT_MARGIN)
        );
    }
}
