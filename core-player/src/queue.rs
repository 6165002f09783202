//! Play queue with identity-preserving mutations.
//!
//! The queue is owned by the coordinator; UI panels read it and request
//! mutations through coordinator methods. All mutations preserve the
//! identity of the currently playing entry unless it is itself removed.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{PlayerError, Result};
use crate::types::QueueTrack;

#[derive(Debug, Default, Clone)]
pub struct PlayQueue {
    tracks: Vec<QueueTrack>,
    /// `None` means no active queue position.
    current_index: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tracks(tracks: Vec<QueueTrack>) -> Self {
        Self {
            tracks,
            current_index: None,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[QueueTrack] {
        &self.tracks
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&QueueTrack> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    pub fn push(&mut self, track: QueueTrack) {
        self.tracks.push(track);
    }

    /// Replace the queue contents and the active position in one step.
    pub fn set_tracks(&mut self, tracks: Vec<QueueTrack>, current_index: Option<usize>) {
        self.tracks = tracks;
        self.current_index = current_index.filter(|i| *i < self.tracks.len());
    }

    /// Mark `index` as the active position and return its entry.
    pub fn select(&mut self, index: usize) -> Result<&QueueTrack> {
        if index >= self.tracks.len() {
            return Err(PlayerError::QueueIndexOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }
        self.current_index = Some(index);
        Ok(&self.tracks[index])
    }

    /// Move to the next entry, if one exists.
    pub fn advance(&mut self) -> Option<&QueueTrack> {
        let next = match self.current_index {
            Some(i) if i + 1 < self.tracks.len() => i + 1,
            Some(_) => return None,
            None => return None,
        };
        self.current_index = Some(next);
        self.tracks.get(next)
    }

    /// Move to the previous entry, if one exists.
    pub fn retreat(&mut self) -> Option<&QueueTrack> {
        let previous = match self.current_index {
            Some(i) if i > 0 => i - 1,
            _ => return None,
        };
        self.current_index = Some(previous);
        self.tracks.get(previous)
    }

    /// Remove the entry at `index`.
    ///
    /// When the removed entry sits below the active position the index is
    /// decremented so the same logical entry stays active. Removing the
    /// active entry leaves the index pointing at the following entry,
    /// clamped to the new length.
    pub fn remove(&mut self, index: usize) -> Result<QueueTrack> {
        if index >= self.tracks.len() {
            return Err(PlayerError::QueueIndexOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }
        let removed = self.tracks.remove(index);
        self.current_index = match self.current_index {
            Some(current) if index < current => Some(current - 1),
            Some(current) if current >= self.tracks.len() => {
                self.tracks.len().checked_sub(1)
            }
            other => other,
        };
        debug!(index, remaining = self.tracks.len(), "Removed queue entry");
        Ok(removed)
    }

    /// Replace the queue with a caller-supplied ordering of (a superset or
    /// subset of) its entries. The active position is recomputed by the
    /// identity of the currently playing entry, not its old index.
    pub fn reorder(&mut self, new_order: Vec<QueueTrack>) {
        let current_identity = self
            .current_track()
            .map(|t| (t.provider.clone(), t.track_id.clone()));
        self.tracks = new_order;
        self.current_index = current_identity.and_then(|(provider, track_id)| {
            self.tracks
                .iter()
                .position(|t| t.identity() == (&provider, track_id.as_str()))
        });
    }

    /// Randomize the queue order while keeping the currently playing entry
    /// at its position.
    pub fn shuffle_with<R: Rng>(&mut self, rng: &mut R) {
        let Some(current) = self.current_index else {
            self.tracks.shuffle(rng);
            return;
        };
        let pinned = self.tracks.remove(current);
        self.tracks.shuffle(rng);
        self.tracks.insert(current.min(self.tracks.len()), pinned);
        // Position unchanged; only the surrounding order moved.
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Empty the queue without touching the active track's playback.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str) -> QueueTrack {
        QueueTrack::new(ProviderKind::YouTube, id)
    }

    fn queue_of(ids: &[&str]) -> PlayQueue {
        PlayQueue::from_tracks(ids.iter().map(|id| track(id)).collect())
    }

    #[test]
    fn select_validates_bounds() {
        let mut queue = queue_of(&["t1", "t2"]);
        assert!(queue.select(1).is_ok());
        assert!(matches!(
            queue.select(2),
            Err(PlayerError::QueueIndexOutOfBounds { index: 2, len: 2 })
        ));
        // A failed select leaves the position untouched.
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn advance_and_retreat_respect_bounds() {
        let mut queue = queue_of(&["t1", "t2", "t3"]);
        queue.select(0).unwrap();

        assert_eq!(queue.advance().map(|t| t.track_id.as_str()), Some("t2"));
        assert_eq!(queue.advance().map(|t| t.track_id.as_str()), Some("t3"));
        assert!(queue.advance().is_none());
        assert_eq!(queue.current_index(), Some(2));

        assert_eq!(queue.retreat().map(|t| t.track_id.as_str()), Some("t2"));
        queue.select(0).unwrap();
        assert!(queue.retreat().is_none());
    }

    #[test]
    fn remove_below_current_preserves_active_track() {
        let mut queue = queue_of(&["t1", "t2", "t3"]);
        queue.select(1).unwrap();

        let removed = queue.remove(0).unwrap();
        assert_eq!(removed.track_id, "t1");
        assert_eq!(
            queue.tracks().iter().map(|t| t.track_id.as_str()).collect::<Vec<_>>(),
            vec!["t2", "t3"]
        );
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current_track().map(|t| t.track_id.as_str()), Some("t2"));
    }

    #[test]
    fn remove_above_current_leaves_index_alone() {
        let mut queue = queue_of(&["t1", "t2", "t3"]);
        queue.select(0).unwrap();
        queue.remove(2).unwrap();
        assert_eq!(queue.current_track().map(|t| t.track_id.as_str()), Some("t1"));
    }

    #[test]
    fn removing_last_active_entry_clamps_index() {
        let mut queue = queue_of(&["t1", "t2"]);
        queue.select(1).unwrap();
        queue.remove(1).unwrap();
        assert_eq!(queue.current_index(), Some(0));

        queue.remove(0).unwrap();
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn reorder_recomputes_index_by_identity() {
        let mut queue = queue_of(&["t1", "t2", "t3"]);
        queue.select(1).unwrap();

        queue.reorder(vec![track("t3"), track("t1"), track("t2")]);
        assert_eq!(queue.current_index(), Some(2));
        assert_eq!(queue.current_track().map(|t| t.track_id.as_str()), Some("t2"));
    }

    #[test]
    fn reorder_dropping_active_entry_clears_index() {
        let mut queue = queue_of(&["t1", "t2"]);
        queue.select(0).unwrap();
        queue.reorder(vec![track("t2")]);
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn shuffle_pins_the_active_entry() {
        let mut queue = queue_of(&["t1", "t2", "t3", "t4", "t5"]);
        queue.select(2).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        queue.shuffle_with(&mut rng);

        assert_eq!(queue.current_index(), Some(2));
        assert_eq!(queue.current_track().map(|t| t.track_id.as_str()), Some("t3"));
        assert_eq!(queue.len(), 5);
    }

    #[test]
    fn clear_empties_without_active_position() {
        let mut queue = queue_of(&["t1", "t2"]);
        queue.select(0).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), None);
    }
}
