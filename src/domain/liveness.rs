//! Reachability state tracking for monitored links.
//!
//! Each link moves from an implicit `UNKNOWN` state to either
//! [`LivenessState::Accessible`] or [`LivenessState::Inaccessible`] on its first
//! observation, and flips between the two afterwards. The first observation is
//! a baseline and never counts as a transition.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Last observed reachability of a link's target URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessState {
    Accessible,
    Inaccessible,
}

impl LivenessState {
    pub fn from_accessible(accessible: bool) -> Self {
        if accessible {
            Self::Accessible
        } else {
            Self::Inaccessible
        }
    }

    pub fn is_accessible(self) -> bool {
        self == Self::Accessible
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accessible => f.write_str("ACCESSIBLE"),
            Self::Inaccessible => f.write_str("INACCESSIBLE"),
        }
    }
}

/// Result of recording one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First observation for this link.
    Baseline,
    /// Same state as last time.
    Unchanged,
    /// State flipped; carries the state it flipped from.
    Changed { previous: LivenessState },
}

/// Notification emitted when a link's reachability changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub link_id: i64,
    pub short_code: String,
    pub long_url: String,
    pub previous: LivenessState,
    pub current: LivenessState,
    pub observed_at: DateTime<Utc>,
}

/// In-memory map from link id to last known state.
///
/// The lock is held only for the read-modify-write of a single entry, so
/// concurrent probes for different links never wait on each other for longer
/// than a map lookup.
#[derive(Debug, Default)]
pub struct LivenessTracker {
    states: Mutex<HashMap<i64, LivenessState>>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `current` for `link_id` and classifies the observation.
    pub fn observe(&self, link_id: i64, current: LivenessState) -> Observation {
        let previous = self.states.lock().insert(link_id, current);

        match previous {
            None => Observation::Baseline,
            Some(previous) if previous == current => Observation::Unchanged,
            Some(previous) => Observation::Changed { previous },
        }
    }

    pub fn get(&self, link_id: i64) -> Option<LivenessState> {
        self.states.lock().get(&link_id).copied()
    }

    /// Returns `(accessible, inaccessible)` counts.
    pub fn counts(&self) -> (usize, usize) {
        let states = self.states.lock();
        let accessible = states.values().filter(|s| s.is_accessible()).count();
        (accessible, states.len() - accessible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_baseline() {
        let tracker = LivenessTracker::new();

        assert_eq!(
            tracker.observe(1, LivenessState::Inaccessible),
            Observation::Baseline
        );
        assert_eq!(tracker.get(1), Some(LivenessState::Inaccessible));
    }

    #[test]
    fn test_repeated_state_is_unchanged() {
        let tracker = LivenessTracker::new();
        tracker.observe(1, LivenessState::Accessible);

        assert_eq!(
            tracker.observe(1, LivenessState::Accessible),
            Observation::Unchanged
        );
    }

    #[test]
    fn test_flip_reports_previous_state() {
        let tracker = LivenessTracker::new();
        tracker.observe(1, LivenessState::Accessible);

        assert_eq!(
            tracker.observe(1, LivenessState::Inaccessible),
            Observation::Changed {
                previous: LivenessState::Accessible
            }
        );
        assert_eq!(
            tracker.observe(1, LivenessState::Accessible),
            Observation::Changed {
                previous: LivenessState::Inaccessible
            }
        );
    }

    #[test]
    fn test_links_are_tracked_independently() {
        let tracker = LivenessTracker::new();
        tracker.observe(1, LivenessState::Accessible);

        assert_eq!(
            tracker.observe(2, LivenessState::Inaccessible),
            Observation::Baseline
        );
        assert_eq!(tracker.counts(), (1, 1));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LivenessState::Accessible.to_string(), "ACCESSIBLE");
        assert_eq!(LivenessState::Inaccessible.to_string(), "INACCESSIBLE");
        assert_eq!(
            LivenessState::from_accessible(false),
            LivenessState::Inaccessible
        );
    }
}
