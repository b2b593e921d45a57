//! Tutor availability blocks and overlap merging.
//!
//! For a given (user, weekday) the stored blocks never overlap or touch. Every
//! insert restores that by absorbing each existing block that intersects the new
//! one, using closed intervals so that touching endpoints count as overlapping.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{display_rank, weekday_serde};
use crate::error::{Result, SchedulingError};
use crate::lesson::{ScheduleId, UserId};

/// A closed time-of-day range. Zero-length blocks are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct TimeBlock {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawBlock {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawBlock> for TimeBlock {
    type Error = SchedulingError;

    fn try_from(raw: RawBlock) -> Result<Self> {
        TimeBlock::new(raw.start, raw.end)
    }
}

impl TimeBlock {
    /// # Errors
    /// Returns `SchedulingError::InvalidRange` if `start` is after `end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start > end {
            return Err(SchedulingError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Closed-interval intersection: blocks that merely touch also overlap.
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    /// The smallest block enclosing both.
    pub fn union(&self, other: &TimeBlock) -> TimeBlock {
        TimeBlock {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A tutor's declared free time on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub user: UserId,
    #[serde(with = "weekday_serde")]
    pub weekday: Weekday,
    pub block: TimeBlock,
}

/// Outcome of merging a new block into a user's existing blocks for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// The block to persist, expanded to cover everything it absorbed.
    pub block: TimeBlock,
    /// Existing blocks that must be deleted.
    pub absorbed: Vec<ScheduleId>,
}

/// Plan the insertion of `block` for (`user`, `weekday`).
///
/// Only blocks with the same user and weekday are considered, and `exclude`
/// (the block being edited, if any) is skipped. Every block that overlaps the
/// incoming one is absorbed in a single pass and the result is widened to the
/// union of all of them.
pub fn plan_merge(
    existing: &[Schedule],
    user: UserId,
    weekday: Weekday,
    block: TimeBlock,
    exclude: Option<ScheduleId>,
) -> MergePlan {
    let mut merged = block;
    let mut absorbed = Vec::new();

    for schedule in existing
        .iter()
        .filter(|s| s.user == user && s.weekday == weekday)
        .filter(|s| Some(s.id) != exclude)
        .filter(|s| s.block.overlaps(&block))
    {
        merged = merged.union(&schedule.block);
        absorbed.push(schedule.id);
    }

    MergePlan {
        block: merged,
        absorbed,
    }
}

/// Order blocks for display: Sunday first through Saturday, then by start time.
pub fn sort_for_display(schedules: &mut [Schedule]) {
    schedules.sort_by_key(|s| (display_rank(s.weekday), s.block.start, s.block.end));
}
