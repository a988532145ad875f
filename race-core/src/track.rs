use serde::{Deserialize, Serialize};

use crate::vector::Vec2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    laps: u32,
    checkpoints: Vec<Vec2>,
}

impl Track {
    /// Returns `None` for a track without checkpoints.
    pub fn new(laps: u32, checkpoints: Vec<Vec2>) -> Option<Self> {
        if checkpoints.is_empty() {
            return None;
        }
        Some(Self { laps, checkpoints })
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    pub fn checkpoints(&self) -> &[Vec2] {
        &self.checkpoints
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Wraps out-of-range indices so a stale target can never panic.
    pub fn checkpoint(&self, index: usize) -> Vec2 {
        self.checkpoints[index % self.checkpoints.len()]
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.checkpoints.len()
    }

    pub fn total_required(&self) -> u32 {
        self.laps * self.checkpoints.len() as u32
    }

    /// Squared length of the opening stretch, checkpoint 0 to checkpoint 1.
    pub fn opening_stretch_sq(&self) -> f64 {
        self.checkpoint(0).dist_sq(self.checkpoint(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Track {
        Track::new(
            3,
            vec![
                Vec2::new(1_000.0, 1_000.0),
                Vec2::new(5_000.0, 1_000.0),
                Vec2::new(5_000.0, 5_000.0),
                Vec2::new(1_000.0, 5_000.0),
            ],
        )
        .expect("non-empty")
    }

    #[test]
    fn empty_track_is_rejected() {
        assert!(Track::new(3, Vec::new()).is_none());
    }

    #[test]
    fn indices_cycle() {
        let track = square();
        assert_eq!(track.next_index(3), 0);
        assert_eq!(track.checkpoint(5), track.checkpoint(1));
        assert_eq!(track.total_required(), 12);
        assert_eq!(track.opening_stretch_sq(), 16_000_000.0);
    }
}
