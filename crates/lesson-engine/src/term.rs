//! Term window resolution -- maps a term label and a request's creation date to
//! the concrete calendar span the term covers.
//!
//! Comparisons are made on naive civil date-times: any zone offset on the
//! reference is dropped before comparing against the term's last day at midnight.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarConfig, MonthDay, Term};
use crate::error::{Result, SchedulingError};

/// The concrete, inclusive date span of a term in one specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermWindow {
    pub lower: NaiveDate,
    pub upper: NaiveDate,
}

impl TermWindow {
    /// Resolve the window for `term` relative to `reference`.
    ///
    /// The term is placed in the reference's year. If the reference is strictly
    /// later than that year's last term day (at midnight), both ends move forward
    /// exactly one year. A reference equal to the last day at midnight stays in
    /// the current year.
    pub fn resolve(config: &CalendarConfig, term: Term, reference: NaiveDateTime) -> Result<Self> {
        let bounds = config.term_bounds(term)?;
        let year = reference.year();

        let lower = in_year(bounds.start, year, term)?;
        let upper = in_year(bounds.end, year, term)?;

        if reference > upper.and_time(NaiveTime::MIN) {
            return Ok(TermWindow {
                lower: in_year(bounds.start, year + 1, term)?,
                upper: in_year(bounds.end, year + 1, term)?,
            });
        }

        Ok(TermWindow { lower, upper })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lower <= date && date <= self.upper
    }

    /// Number of days in the window, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.upper - self.lower).num_days() + 1
    }
}

fn in_year(day: MonthDay, year: i32, term: Term) -> Result<NaiveDate> {
    day.in_year(year).ok_or_else(|| {
        SchedulingError::InvalidInput(format!(
            "term {} boundary {:02}-{:02} does not exist in {}",
            term, day.month, day.day, year
        ))
    })
}

/// Resolve a term window from a term label and a naive reference date-time.
///
/// # Errors
/// Returns `SchedulingError::InvalidTerm` if `term_label` is not one of
/// `Sept-Christmas`, `Jan-Easter` or `March-June`.
pub fn resolve_term_window(
    config: &CalendarConfig,
    term_label: &str,
    reference: NaiveDateTime,
) -> Result<TermWindow> {
    let term: Term = term_label.parse()?;
    TermWindow::resolve(config, term, reference)
}

/// Like [`resolve_term_window`], for a zoned reference. The zone is stripped by
/// taking the reference's local civil time, not by converting to UTC.
pub fn resolve_term_window_at<Tz: TimeZone>(
    config: &CalendarConfig,
    term_label: &str,
    reference: &DateTime<Tz>,
) -> Result<TermWindow> {
    resolve_term_window(config, term_label, reference.naive_local())
}

/// Parse a reference date-time string.
///
/// Accepts RFC 3339 (the offset is discarded, local civil time is kept),
/// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD`
/// (taken as midnight).
///
/// # Errors
/// Returns `SchedulingError::InvalidInput` for anything else.
pub fn parse_reference(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();

    if let Ok(zoned) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(zoned.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(SchedulingError::InvalidInput(format!(
        "reference date must be a date or date-time, got {:?}",
        input
    )))
}

/// The current civil date-time in an IANA timezone (e.g. `Europe/London`).
///
/// # Errors
/// Returns `SchedulingError::InvalidInput` if the timezone is not a valid IANA identifier.
pub fn now_in(timezone: &str) -> Result<NaiveDateTime> {
    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| SchedulingError::InvalidInput(format!("unknown timezone: {}", timezone)))?;
    Ok(Utc::now().with_timezone(&tz).naive_local())
}
