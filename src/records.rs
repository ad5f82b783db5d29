//! Canonical trip records and the normalizer that builds them.
//!
//! A [`TripRecord`] is derived once per ingested row. Its hour bucket,
//! weekday and calendar date are always computed from the timestamp, so they
//! cannot drift apart.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::analyzers::regime::DayTypeRegime;
use crate::parser::RawTrip;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A timestamp truncated to its containing hour, displayed as `HH:00`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourBucket(u8);

impl HourBucket {
    pub const COUNT: usize = 24;

    pub fn new(hour: u32) -> Option<Self> {
        (hour < Self::COUNT as u32).then_some(Self(hour as u8))
    }

    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self(timestamp.hour() as u8)
    }

    /// Every bucket from `00:00` to `23:00`, in order.
    pub fn all() -> impl Iterator<Item = HourBucket> {
        (0..Self::COUNT as u8).map(Self)
    }

    pub const fn hour(&self) -> u32 {
        self.0 as u32
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl Serialize for HourBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One trip occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    route_code: String,
    passenger_count: u32,
    timestamp: NaiveDateTime,
}

impl TripRecord {
    pub fn new(route_code: impl Into<String>, passenger_count: u32, timestamp: NaiveDateTime) -> Self {
        Self {
            route_code: route_code.into(),
            passenger_count,
            timestamp,
        }
    }

    pub fn route_code(&self) -> &str {
        &self.route_code
    }

    pub fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn hour(&self) -> HourBucket {
        HourBucket::of(&self.timestamp)
    }

    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday()
    }

    pub fn calendar_date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn day_type(&self) -> DayTypeRegime {
        DayTypeRegime::of(self.weekday())
    }
}

/// Converts raw rows into trip records.
///
/// Rows whose timestamp cannot be parsed are dropped. An unparseable
/// passenger count never drops a row; it counts as zero passengers.
pub fn normalize(rows: &[RawTrip]) -> Vec<TripRecord> {
    let records: Vec<TripRecord> = rows
        .iter()
        .filter_map(|row| {
            let timestamp = parse_timestamp(&row.started_at)?;
            Some(TripRecord::new(
                row.route_code.trim(),
                parse_passengers(&row.passengers),
                timestamp,
            ))
        })
        .collect();

    debug!(
        rows = rows.len(),
        records = records.len(),
        dropped = rows.len() - records.len(),
        "Normalized trip rows"
    );
    records
}

/// Parses a combined date-and-time cell.
///
/// Slash dates are read day-first: an ambiguous `04/03/2024` is 4 March, never
/// April 3rd, and a month-first date such as `03/25/2024` does not parse.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parses a passenger count, coercing anything unusable to zero.
pub fn parse_passengers(raw: &str) -> u32 {
    let raw = raw.trim();
    if let Ok(count) = raw.parse::<u32>() {
        return count;
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Sorted, de-duplicated route codes present in `records`.
pub fn available_routes(records: &[TripRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.route_code.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Inclusive calendar-date window; an open bound accepts everything on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    pub fn apply(&self, records: Vec<TripRecord>) -> Vec<TripRecord> {
        if self.from.is_none() && self.to.is_none() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| self.contains(r.calendar_date()))
            .collect()
    }
}
