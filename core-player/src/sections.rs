//! Section lookup and loop-seek debouncing.
//!
//! Sections are supplied read-only by an external metadata source, ordered
//! by start and non-overlapping. The coordinator recomputes the current
//! section on every authoritative position update and, when a loop section
//! is set, decides here whether a boundary seek is due.
//!
//! The cooldown uses a timestamp comparison rather than a cancellable
//! timer, which assumes status updates arrive more often than the cooldown
//! window; adapters poll at 200-500ms so that holds.

use std::time::Instant;
use tracing::debug;

use crate::types::Section;

/// How close to the loop section's end counts as reaching the boundary.
pub const LOOP_BOUNDARY_THRESHOLD_MS: u64 = 200;
/// Minimum spacing between loop-triggered seeks, so rapid updates crossing
/// the boundary produce exactly one seek.
pub const LOOP_SEEK_COOLDOWN_MS: u64 = 800;

/// The section whose `[start_ms, end_ms)` range contains `position_ms`.
pub fn section_at(sections: &[Section], position_ms: u64) -> Option<&Section> {
    sections.iter().find(|s| s.contains(position_ms))
}

/// Tracks which section loops and debounces the boundary seek.
#[derive(Debug, Default)]
pub struct LoopController {
    loop_section_id: Option<String>,
    last_loop_seek: Option<Instant>,
}

impl LoopController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loop_section_id(&self) -> Option<&str> {
        self.loop_section_id.as_deref()
    }

    /// Set or clear the looped section. At most one section loops at a
    /// time; setting a new one replaces the previous.
    pub fn set_loop_section(&mut self, section_id: Option<String>) {
        if self.loop_section_id != section_id {
            debug!(section = ?section_id, "Loop section changed");
            self.loop_section_id = section_id;
            self.last_loop_seek = None;
        }
    }

    /// Clear loop state; called on track change.
    pub fn reset(&mut self) {
        self.loop_section_id = None;
        self.last_loop_seek = None;
    }

    /// Decide whether the position update at `now` warrants a loop seek.
    /// Returns the seek target (the looped section's start) at most once
    /// per cooldown window.
    pub fn evaluate(
        &mut self,
        sections: &[Section],
        position_ms: u64,
        now: Instant,
    ) -> Option<u64> {
        let id = self.loop_section_id.as_deref()?;
        let section = sections.iter().find(|s| s.id == id)?;

        if position_ms + LOOP_BOUNDARY_THRESHOLD_MS < section.end_ms {
            return None;
        }
        if let Some(last) = self.last_loop_seek {
            let elapsed = now.saturating_duration_since(last).as_millis() as u64;
            if elapsed < LOOP_SEEK_COOLDOWN_MS {
                return None;
            }
        }

        debug!(section = id, target_ms = section.start_ms, "Loop boundary reached");
        self.last_loop_seek = Some(now);
        Some(section.start_ms)
    }
}
