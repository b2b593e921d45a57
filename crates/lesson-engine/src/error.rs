//! Error types for lesson-engine operations.

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Unknown term: {0}")]
    InvalidTerm(String),

    #[error("Unknown frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Start time {start} cannot be after end time {end}")]
    InvalidRange { start: NaiveTime, end: NaiveTime },

    #[error("You must assign a {0} before allocating the lesson")]
    MissingAssignment(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
