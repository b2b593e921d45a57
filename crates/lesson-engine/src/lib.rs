//! # lesson-engine
//!
//! Term-based recurring lesson allocation and tutor availability merging for a
//! tutoring service.
//!
//! Given a lesson request's term, weekday, frequency and creation date, the
//! engine deterministically produces every dated occurrence of the lesson within
//! the academic term. Tutor availability blocks are kept minimal per weekday by
//! coalescing overlapping or touching blocks on insert.
//!
//! ## Modules
//!
//! - [`calendar`] — term, frequency and weekday labels plus the lookup tables
//! - [`term`] — term label + reference date → concrete term window
//! - [`allocator`] — term window → lazy sequence of dated occurrences
//! - [`lesson`] — lesson requests, allocated lessons and allocation status
//! - [`availability`] — availability blocks and overlap merging
//! - [`store`] — persistence of requests, lessons, tutors and blocks
//! - [`error`] — Error types

pub mod allocator;
pub mod availability;
pub mod calendar;
pub mod error;
pub mod lesson;
pub mod store;
pub mod term;

pub use allocator::{generate_occurrences, parse_start_time, Occurrence, Occurrences};
pub use availability::{plan_merge, sort_for_display, MergePlan, Schedule, TimeBlock};
pub use calendar::{parse_weekday, weekday_label, CalendarConfig, Frequency, Term};
pub use error::SchedulingError;
pub use lesson::{
    AllocatedLesson, LessonId, LessonRequest, LessonStatus, NewLessonRequest, RequestId,
    ScheduleId, UserId,
};
pub use store::{SchedulingStore, Tutor, TutorListing};
pub use term::{parse_reference, resolve_term_window, resolve_term_window_at, TermWindow};
