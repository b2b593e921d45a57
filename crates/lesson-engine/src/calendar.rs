//! Calendar vocabulary and lookup tables.
//!
//! Term labels, frequency labels and weekday labels are exact, case-sensitive
//! strings. The numeric tables behind them (term boundaries, frequency steps,
//! allowed durations) live in [`CalendarConfig`], which is built once at
//! startup and passed by reference into the allocator.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

/// A named academic term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "Sept-Christmas")]
    SeptChristmas,
    #[serde(rename = "Jan-Easter")]
    JanEaster,
    #[serde(rename = "March-June")]
    MarchJune,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::SeptChristmas, Term::JanEaster, Term::MarchJune];

    pub fn label(self) -> &'static str {
        match self {
            Term::SeptChristmas => "Sept-Christmas",
            Term::JanEaster => "Jan-Easter",
            Term::MarchJune => "March-June",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Term {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self> {
        Term::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| SchedulingError::InvalidTerm(s.to_string()))
    }
}

/// How often a recurring lesson repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Weekly,
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Frequency::Weekly, Frequency::BiWeekly, Frequency::Monthly];

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Weekly => "Weekly",
            Frequency::BiWeekly => "Bi-Weekly",
            Frequency::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self> {
        Frequency::ALL
            .into_iter()
            .find(|f| f.label() == s)
            .ok_or_else(|| SchedulingError::InvalidFrequency(s.to_string()))
    }
}

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
    (Weekday::Sun, "Sunday"),
];

/// Parse a capitalized English day name (`Monday` … `Sunday`).
pub fn parse_weekday(label: &str) -> Result<Weekday> {
    WEEKDAYS
        .iter()
        .find(|(_, name)| *name == label)
        .map(|(day, _)| *day)
        .ok_or_else(|| SchedulingError::InvalidInput(format!("unknown weekday: {}", label)))
}

pub fn weekday_label(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_monday() as usize].1
}

/// Display ordering for schedule blocks: Sunday=1, Monday=2, … Saturday=7.
pub fn display_rank(day: Weekday) -> u32 {
    day.number_from_sunday()
}

/// Serde adapter storing a [`Weekday`] as its full English label.
pub mod weekday_serde {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(super::weekday_label(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let label = String::deserialize(deserializer)?;
        super::parse_weekday(&label).map_err(serde::de::Error::custom)
    }
}

/// A month/day pair with no year attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }

    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

/// Fixed calendar boundaries of a term, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBounds {
    pub start: MonthDay,
    pub end: MonthDay,
}

/// Immutable lookup tables shared by the allocator and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub terms: BTreeMap<Term, TermBounds>,
    pub frequency_weeks: BTreeMap<Frequency, u32>,
    /// Allowed lesson durations in minutes.
    pub durations: Vec<u32>,
    pub max_description_len: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        let terms = BTreeMap::from([
            (
                Term::SeptChristmas,
                TermBounds {
                    start: MonthDay::new(9, 1),
                    end: MonthDay::new(12, 25),
                },
            ),
            (
                Term::JanEaster,
                TermBounds {
                    start: MonthDay::new(1, 1),
                    end: MonthDay::new(4, 15),
                },
            ),
            (
                Term::MarchJune,
                TermBounds {
                    start: MonthDay::new(3, 1),
                    end: MonthDay::new(6, 30),
                },
            ),
        ]);
        let frequency_weeks = BTreeMap::from([
            (Frequency::Weekly, 1),
            (Frequency::BiWeekly, 2),
            (Frequency::Monthly, 4),
        ]);
        Self {
            terms,
            frequency_weeks,
            durations: vec![60, 120],
            max_description_len: 1000,
        }
    }
}

impl CalendarConfig {
    /// Parse a JSON config document. Tables the document omits keep their
    /// default entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: CalendarConfig = serde_json::from_str(json)?;
        let defaults = CalendarConfig::default();
        for (term, bounds) in defaults.terms {
            config.terms.entry(term).or_insert(bounds);
        }
        for (freq, weeks) in defaults.frequency_weeks {
            config.frequency_weeks.entry(freq).or_insert(weeks);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that every boundary is a real day in every year, that each
    /// term's start precedes its end, and that steps and durations are positive.
    pub fn validate(&self) -> Result<()> {
        for (term, bounds) in &self.terms {
            // 2001 is not a leap year, so Feb 29 is rejected here.
            let start = bounds.start.in_year(2001);
            let end = bounds.end.in_year(2001);
            match (start, end) {
                (Some(start), Some(end)) if start <= end => {}
                (Some(_), Some(_)) => {
                    return Err(SchedulingError::InvalidInput(format!(
                        "term {} starts after it ends",
                        term
                    )))
                }
                _ => {
                    return Err(SchedulingError::InvalidInput(format!(
                        "term {} has an invalid boundary date",
                        term
                    )))
                }
            }
        }
        if let Some((freq, _)) = self.frequency_weeks.iter().find(|(_, w)| **w == 0) {
            return Err(SchedulingError::InvalidInput(format!(
                "frequency {} must step at least one week",
                freq
            )));
        }
        if self.durations.is_empty() || self.durations.contains(&0) {
            return Err(SchedulingError::InvalidInput(
                "allowed durations must be a non-empty list of positive minutes".to_string(),
            ));
        }
        Ok(())
    }

    pub fn term_bounds(&self, term: Term) -> Result<TermBounds> {
        self.terms
            .get(&term)
            .copied()
            .ok_or_else(|| SchedulingError::InvalidTerm(term.to_string()))
    }

    pub fn step_weeks(&self, frequency: Frequency) -> Result<u32> {
        self.frequency_weeks
            .get(&frequency)
            .copied()
            .ok_or_else(|| SchedulingError::InvalidFrequency(frequency.to_string()))
    }

    pub fn check_duration(&self, minutes: u32) -> Result<()> {
        if self.durations.contains(&minutes) {
            Ok(())
        } else {
            Err(SchedulingError::InvalidInput(format!(
                "duration {} is not one of the allowed durations {:?}",
                minutes, self.durations
            )))
        }
    }
}

