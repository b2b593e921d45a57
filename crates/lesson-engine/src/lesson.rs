//! Lesson requests, their allocated occurrences, and the allocation status.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::allocator::Occurrences;
use crate::calendar::{weekday_serde, CalendarConfig, Frequency, Term};
use crate::error::{Result, SchedulingError};
use crate::term::TermWindow;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// A student, tutor or administrator.
    UserId
);
id_type!(RequestId);
id_type!(LessonId);
id_type!(ScheduleId);

/// Allocation status of a lesson request.
///
/// Serialized as lowercase `unallocated` / `allocated`. Historical spellings
/// (`Pending`, `pending`, `Unallocated`, `Allocated`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LessonStatus {
    #[default]
    #[serde(
        rename = "unallocated",
        alias = "Unallocated",
        alias = "pending",
        alias = "Pending"
    )]
    Unallocated,
    #[serde(rename = "allocated", alias = "Allocated")]
    Allocated,
}

impl LessonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Unallocated => "unallocated",
            LessonStatus::Allocated => "allocated",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unallocated" | "pending" => Ok(LessonStatus::Unallocated),
            "allocated" => Ok(LessonStatus::Allocated),
            _ => Err(SchedulingError::InvalidInput(format!(
                "unknown lesson status: {}",
                s
            ))),
        }
    }
}

/// Fields a student supplies when asking for lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLessonRequest {
    pub student: UserId,
    pub preferred_tutor: Option<UserId>,
    pub subject: String,
    pub term: Term,
    #[serde(with = "weekday_serde")]
    pub weekday: Weekday,
    pub frequency: Frequency,
    pub duration_minutes: u32,
    pub description: String,
    pub created_at: NaiveDateTime,
}

/// A student's recurring lesson need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRequest {
    pub id: RequestId,
    pub student: UserId,
    pub preferred_tutor: Option<UserId>,
    /// Assigned by an administrator on allocation.
    pub tutor: Option<UserId>,
    pub subject: String,
    pub term: Term,
    #[serde(with = "weekday_serde")]
    pub weekday: Weekday,
    pub frequency: Frequency,
    pub duration_minutes: u32,
    pub description: String,
    pub status: LessonStatus,
    pub start_time: Option<NaiveTime>,
    pub created_at: NaiveDateTime,
}

impl LessonRequest {
    pub fn from_new(id: RequestId, new: NewLessonRequest) -> Self {
        Self {
            id,
            student: new.student,
            preferred_tutor: new.preferred_tutor,
            tutor: None,
            subject: new.subject,
            term: new.term,
            weekday: new.weekday,
            frequency: new.frequency,
            duration_minutes: new.duration_minutes,
            description: new.description,
            status: LessonStatus::Unallocated,
            start_time: None,
            created_at: new.created_at,
        }
    }

    /// The term window this request falls in, relative to its creation date.
    pub fn term_window(&self, config: &CalendarConfig) -> Result<TermWindow> {
        TermWindow::resolve(config, self.term, self.created_at)
    }

    /// Every occurrence this request would produce at `start_time`.
    pub fn occurrences(&self, config: &CalendarConfig, start_time: NaiveTime) -> Result<Occurrences> {
        let window = self.term_window(config)?;
        let step_weeks = config.step_weeks(self.frequency)?;
        Ok(Occurrences::new(window, self.weekday, step_weeks, start_time))
    }
}

/// One persisted occurrence of an allocated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedLesson {
    pub id: LessonId,
    pub request: RequestId,
    /// 1-based, unique within `request`.
    pub occurrence: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub subject: String,
    pub student: UserId,
    pub tutor: UserId,
}
