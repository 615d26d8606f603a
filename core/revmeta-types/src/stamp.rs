//! Creation stamps for snapshots.
//!
//! Snapshots of one item must sort strictly by creation, even when several
//! are written within the same millisecond. A stamp pairs wall-clock time
//! with a sequence counter that breaks ties.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

/// A strictly monotonic creation stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotStamp {
    /// Milliseconds since Unix epoch.
    wall_time: u64,
    /// Tie-breaker for stamps issued within the same millisecond.
    sequence: u32,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl SnapshotStamp {
    /// A stamp for the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            wall_time: now_millis(),
            sequence: 0,
        }
    }

    /// Creates a stamp from components.
    #[must_use]
    pub const fn new(wall_time: u64, sequence: u32) -> Self {
        Self {
            wall_time,
            sequence,
        }
    }

    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Issues the next stamp after `self`.
    ///
    /// Jumps to the current wall-clock time when it has advanced, otherwise
    /// bumps the sequence so the result still sorts after `self`.
    #[must_use]
    pub fn next(&self) -> Self {
        let now = now_millis();
        if now > self.wall_time {
            Self {
                wall_time: now,
                sequence: 0,
            }
        } else {
            Self {
                wall_time: self.wall_time,
                sequence: self.sequence.saturating_add(1),
            }
        }
    }

    /// Issues the next stamp after an optional previous one.
    #[must_use]
    pub fn after(previous: Option<Self>) -> Self {
        match previous {
            Some(prev) => prev.next(),
            None => Self::now(),
        }
    }
}

impl PartialOrd for SnapshotStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SnapshotStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_time
            .cmp(&other.wall_time)
            .then(self.sequence.cmp(&other.sequence))
    }
}
