//! # Core Layout
//!
//! Window geometry for the player's three presentations: viewport-clamped
//! positioning, compact-mode corner snapping, scale preferences, and
//! persistence across sessions through the host's settings storage.
//!
//! Geometry is mutated only by direct user manipulation, never by playback
//! events.

pub mod error;
pub mod geometry;
pub mod store;

pub use error::{LayoutError, Result};
pub use geometry::{
    clamp_position, corner_positions, snap_to_corner, Point, Size, Viewport, VIEWPORT_MARGIN,
};
pub use store::{
    LayoutMode, LayoutStore, PositionRecord, ScalePrefs, POSITIONS_KEY, SCALE_PREFS_KEY,
};
