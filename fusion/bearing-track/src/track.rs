//! A single track's position history.

use vecmath::Vec3;

/// `-1` degraded, `0` new, `1` valid — mirrors the wire `track_type` field.
pub const TRACK_DEGRADED: i8 = -1;
pub const TRACK_NEW: i8 = 0;
pub const TRACK_VALID: i8 = 1;

#[derive(Debug, Clone)]
pub struct Track {
    pub id: u64,
    pub track_type: i8,
    /// (monotonic arrival time, solved position), oldest first.
    pub position_history: Vec<(f64, Vec3)>,
}

impl Track {
    /// A freshly created track always has exactly one position: its
    /// creation point.
    pub fn new(id: u64, time: f64, position: Vec3) -> Self {
        Self {
            id,
            track_type: TRACK_NEW,
            position_history: vec![(time, position)],
        }
    }

    pub fn push(&mut self, time: f64, position: Vec3) {
        self.position_history.push((time, position));
        self.track_type = TRACK_VALID;
    }

    pub fn latest_position(&self) -> Vec3 {
        self.position_history
            .last()
            .expect("a track always has at least one position")
            .1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_track_has_exactly_one_position() {
        let t = Track::new(1, 0.0, Vec3::from_cartesian(1.0, 2.0, 3.0));
        assert_eq!(t.position_history.len(), 1);
        assert_eq!(t.track_type, TRACK_NEW);
    }

    #[test]
    fn push_appends_and_marks_valid() {
        let mut t = Track::new(1, 0.0, Vec3::from_cartesian(0.0, 0.0, 0.0));
        t.push(1.0, Vec3::from_cartesian(1.0, 0.0, 0.0));
        assert_eq!(t.position_history.len(), 2);
        assert_eq!(t.track_type, TRACK_VALID);
        assert_eq!(t.latest_position().x(), 1.0);
    }
}
