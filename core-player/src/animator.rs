//! Display position smoothing.
//!
//! Adapters deliver authoritative position updates irregularly, roughly
//! every 200-500ms. Rendering that value directly produces a visibly
//! stuttering progress indicator. [`SeekDisplayAnimator`] interpolates
//! between updates using elapsed wall-clock time per animation tick, and
//! resynchronizes to the authoritative value whenever the two diverge
//! beyond a snap threshold or the authoritative position moves backwards
//! (a seek or restart).
//!
//! The tick timestamp is passed in by the caller, so tests drive the
//! animator with fabricated instants instead of real time.

use std::time::Instant;

/// Divergence beyond which the display snaps to the authoritative value
/// instead of absorbing the difference as jitter.
pub const SNAP_THRESHOLD_MS: u64 = 150;

#[derive(Debug)]
pub struct SeekDisplayAnimator {
    display_position_ms: f64,
    last_authoritative_ms: Option<u64>,
    duration_ms: Option<u64>,
    is_playing: bool,
    last_tick: Option<Instant>,
}

impl Default for SeekDisplayAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SeekDisplayAnimator {
    pub fn new() -> Self {
        Self {
            display_position_ms: 0.0,
            last_authoritative_ms: None,
            duration_ms: None,
            is_playing: false,
            last_tick: None,
        }
    }

    /// The smoothed value shown to the user.
    pub fn display_position_ms(&self) -> u64 {
        self.display_position_ms.round() as u64
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Feed an authoritative `(position, duration, is_playing)` update.
    ///
    /// Small forward jitter is absorbed so the indicator stays continuous;
    /// the display snaps when divergence exceeds [`SNAP_THRESHOLD_MS`], when
    /// the authoritative position moves meaningfully backwards, or while
    /// playback is paused (the display is frozen at the authoritative
    /// position then).
    pub fn apply_authoritative(
        &mut self,
        position_ms: u64,
        duration_ms: Option<u64>,
        is_playing: bool,
    ) {
        if let Some(duration) = duration_ms {
            self.duration_ms = Some(duration);
        }

        let went_backwards = self
            .last_authoritative_ms
            .is_some_and(|last| position_ms + SNAP_THRESHOLD_MS < last);
        let divergence = (position_ms as f64 - self.display_position_ms).abs();
        let first_update = self.last_authoritative_ms.is_none();

        if !is_playing
            || first_update
            || went_backwards
            || divergence > SNAP_THRESHOLD_MS as f64
        {
            self.display_position_ms = position_ms as f64;
        }

        self.last_authoritative_ms = Some(position_ms);
        self.is_playing = is_playing;
        if !is_playing {
            // Drop the tick reference so the next tick after resume does not
            // credit the paused interval as elapsed playback.
            self.last_tick = None;
        }
        self.clamp_to_duration();
    }

    /// Advance one animation frame at `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.is_playing {
            if let Some(last) = self.last_tick {
                let elapsed_ms = now.saturating_duration_since(last).as_secs_f64() * 1000.0;
                self.display_position_ms += elapsed_ms;
                self.clamp_to_duration();
            }
        }
        self.last_tick = Some(now);
    }

    /// Forget everything; called when the track changes.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn clamp_to_duration(&mut self) {
        if let Some(duration) = self.duration_ms {
            if self.display_position_ms > duration as f64 {
                self.display_position_ms = duration as f64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ticks_advance_display_while_playing() {
        let mut animator = SeekDisplayAnimator::new();
        let start = Instant::now();

        animator.apply_authoritative(1_000, Some(60_000), true);
        animator.tick(start);
        animator.tick(start + Duration::from_millis(100));
        animator.tick(start + Duration::from_millis(200));

        assert_eq!(animator.display_position_ms(), 1_200);
    }

    #[test]
    fn small_jitter_is_absorbed() {
        let mut animator = SeekDisplayAnimator::new();
        let start = Instant::now();

        animator.apply_authoritative(1_000, Some(60_000), true);
        animator.tick(start);
        animator.tick(start + Duration::from_millis(200));
        // Authoritative arrives 80ms behind the interpolated value; the
        // display keeps advancing instead of jumping back.
        animator.apply_authoritative(1_120, None, true);
        assert_eq!(animator.display_position_ms(), 1_200);
    }

    #[test]
    fn large_divergence_snaps() {
        let mut animator = SeekDisplayAnimator::new();
        animator.apply_authoritative(1_000, Some(60_000), true);
        animator.apply_authoritative(5_000, None, true);
        assert_eq!(animator.display_position_ms(), 5_000);
    }

    #[test]
    fn backward_authoritative_movement_snaps() {
        let mut animator = SeekDisplayAnimator::new();
        animator.apply_authoritative(15_000, Some(60_000), true);
        // A loop seek back to the section start.
        animator.apply_authoritative(0, None, true);
        assert_eq!(animator.display_position_ms(), 0);
    }

    #[test]
    fn display_freezes_while_paused() {
        let mut animator = SeekDisplayAnimator::new();
        let start = Instant::now();

        animator.apply_authoritative(2_000, Some(60_000), false);
        animator.tick(start);
        animator.tick(start + Duration::from_secs(5));
        assert_eq!(animator.display_position_ms(), 2_000);
    }

    #[test]
    fn resume_does_not_credit_paused_interval() {
        let mut animator = SeekDisplayAnimator::new();
        let start = Instant::now();

        animator.apply_authoritative(2_000, Some(60_000), true);
        animator.tick(start);
        animator.apply_authoritative(2_000, None, false);
        // Long pause.
        animator.apply_authoritative(2_000, None, true);
        animator.tick(start + Duration::from_secs(10));
        animator.tick(start + Duration::from_secs(10) + Duration::from_millis(50));
        assert_eq!(animator.display_position_ms(), 2_050);
    }

    #[test]
    fn display_clamps_to_duration() {
        let mut animator = SeekDisplayAnimator::new();
        let start = Instant::now();

        animator.apply_authoritative(59_900, Some(60_000), true);
        animator.tick(start);
        animator.tick(start + Duration::from_secs(2));
        assert_eq!(animator.display_position_ms(), 60_000);
    }

    #[test]
    fn display_is_monotonic_while_playing_without_corrections() {
        let mut animator = SeekDisplayAnimator::new();
        let start = Instant::now();
        animator.apply_authoritative(0, Some(600_000), true);

        let mut previous = 0;
        for i in 0..100u64 {
            animator.tick(start + Duration::from_millis(i * 16));
            if i % 20 == 0 {
                // Coarse authoritative updates trailing slightly behind.
                animator.apply_authoritative(i * 16, None, true);
            }
            let now = animator.display_position_ms();
            assert!(now >= previous, "display went backwards at tick {i}");
            previous = now;
        }
    }
}
