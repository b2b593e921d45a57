//! Occurrence generation -- walks a term window and emits one dated lesson per
//! period on the requested weekday.
//!
//! The first occurrence is the first matching weekday on or after the window's
//! lower date. Later occurrences step forward by the frequency's whole number of
//! weeks until the candidate passes the window's upper date.

use std::iter::FusedIterator;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{parse_weekday, CalendarConfig, Frequency};
use crate::error::{Result, SchedulingError};
use crate::term::TermWindow;

/// One concrete dated and timed instance of a recurring lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// 1-based position within the term.
    pub index: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Lazy sequence of occurrences inside a term window.
///
/// The sequence is finite and cheap to clone; clone it before iterating to
/// replay it from the start.
#[derive(Debug, Clone)]
pub struct Occurrences {
    cursor: Option<NaiveDate>,
    upper: NaiveDate,
    weekday: Weekday,
    step_days: i64,
    time: NaiveTime,
    emitted: u32,
}

impl Occurrences {
    pub fn new(window: TermWindow, weekday: Weekday, step_weeks: u32, time: NaiveTime) -> Self {
        Self {
            cursor: Some(window.lower),
            upper: window.upper,
            weekday,
            step_days: i64::from(step_weeks.max(1)) * 7,
            time,
            emitted: 0,
        }
    }

    fn remaining(&self) -> usize {
        match self.cursor.and_then(|c| align_to_weekday(c, self.weekday)) {
            Some(first) if first <= self.upper => {
                ((self.upper - first).num_days() / self.step_days) as usize + 1
            }
            _ => 0,
        }
    }
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        let candidate = self.cursor?;
        let date = match align_to_weekday(candidate, self.weekday) {
            Some(date) if date <= self.upper => date,
            _ => {
                self.cursor = None;
                return None;
            }
        };

        self.emitted += 1;
        self.cursor = date.checked_add_signed(TimeDelta::days(self.step_days));

        Some(Occurrence {
            index: self.emitted,
            date,
            time: self.time,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Occurrences {}

impl FusedIterator for Occurrences {}

/// Advance `date` to the first day on or after it that falls on `weekday`.
fn align_to_weekday(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + weekday.num_days_from_monday() - date.weekday().num_days_from_monday()) % 7;
    date.checked_add_signed(TimeDelta::days(i64::from(ahead)))
}

/// Generate the occurrences of a recurring lesson within a term window.
///
/// # Arguments
/// - `window` -- the resolved term window
/// - `weekday_label` -- day name, e.g. "Tuesday"
/// - `frequency_label` -- "Weekly", "Bi-Weekly" or "Monthly" (1, 2 or 4 weeks)
/// - `start_time` -- time of day attached to every occurrence
///
/// # Errors
/// Returns `SchedulingError::InvalidFrequency` if the frequency is unrecognized.
/// Returns `SchedulingError::InvalidInput` if the weekday is unrecognized.
pub fn generate_occurrences(
    config: &CalendarConfig,
    window: &TermWindow,
    weekday_label: &str,
    frequency_label: &str,
    start_time: NaiveTime,
) -> Result<Occurrences> {
    let frequency: Frequency = frequency_label.parse()?;
    let weekday = parse_weekday(weekday_label)?;
    let step_weeks = config.step_weeks(frequency)?;
    Ok(Occurrences::new(*window, weekday, step_weeks, start_time))
}

/// Parse an `HH:MM` 24-hour time string.
///
/// # Errors
/// Returns `SchedulingError::InvalidInput` if the string is not a valid time.
pub fn parse_start_time(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M").map_err(|_| {
        SchedulingError::InvalidInput(format!("start time must be HH:MM, got {:?}", input))
    })
}
