//! Record normalization: loosely typed rows in, validated observations out.
//!
//! Field names are matched after trimming, timestamps are parsed day-first,
//! and channel values are coerced to finite floats. Any row that fails one of
//! these steps is dropped whole; nothing here returns an error.

use crate::config::PipelineConfig;
use crate::core::types::{Observation, ObservationSeries};
use crate::source::RawRecord;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Counts describing what normalization kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    /// Rows handed to the normalizer
    pub rows_received: usize,
    /// Rows that became observations
    pub rows_kept: usize,
    /// Rows dropped for a missing or unparseable timestamp
    pub dropped_bad_timestamp: usize,
    /// Rows dropped for a missing or non-numeric channel value
    pub dropped_bad_reading: usize,
}

impl NormalizeStats {
    /// Total number of dropped rows.
    pub fn rows_dropped(&self) -> usize {
        self.dropped_bad_timestamp + self.dropped_bad_reading
    }
}

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Timestamp,
    Reading,
}

/// Normalize raw rows into a time-ordered observation series.
pub fn normalize_records(
    records: &[RawRecord],
    config: &PipelineConfig,
) -> (ObservationSeries, NormalizeStats) {
    let mut stats = NormalizeStats {
        rows_received: records.len(),
        ..Default::default()
    };
    let mut observations = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        match normalize_record(record, config) {
            Ok(obs) => observations.push(obs),
            Err(Rejection::Timestamp) => {
                stats.dropped_bad_timestamp += 1;
                tracing::debug!(row, "dropping row: missing or unparseable timestamp");
            }
            Err(Rejection::Reading) => {
                stats.dropped_bad_reading += 1;
                tracing::debug!(row, "dropping row: missing or non-numeric reading");
            }
        }
    }

    stats.rows_kept = observations.len();
    (ObservationSeries::from_unsorted(observations), stats)
}

fn normalize_record(record: &RawRecord, config: &PipelineConfig) -> Result<Observation, Rejection> {
    let timestamp = field(record, &config.timestamp_field)
        .and_then(Value::as_str)
        .and_then(parse_day_first)
        .ok_or(Rejection::Timestamp)?;

    let mut readings = [0.0; 3];
    for (slot, spec) in readings.iter_mut().zip(config.channels.iter()) {
        *slot = field(record, &spec.field)
            .and_then(coerce_reading)
            .ok_or(Rejection::Reading)?;
    }

    Ok(Observation::new(timestamp, readings))
}

/// Look up a field by name, ignoring surrounding whitespace on both sides.
fn field<'a>(record: &'a RawRecord, name: &str) -> Option<&'a Value> {
    let name = name.trim();
    record
        .iter()
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value)
}

/// Coerce a loosely typed cell to a finite reading.
///
/// Numbers and numeric strings are accepted; booleans, nulls, blanks and
/// non-finite values are not.
pub fn coerce_reading(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parse a day-first date-time string such as `05/03/2024 14:30`.
///
/// Year-first dates (`2024-03-05 14:30:00`) are unambiguous and accepted too.
/// A date without a time component is taken as midnight.
pub fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let (date_part, time_part) = match s.split_once(|c: char| c == ' ' || c == 'T') {
        Some((date, time)) => (date, Some(time.trim())),
        None => (s, None),
    };

    let date = parse_date(date_part)?;
    let time = match time_part {
        None | Some("") => NaiveTime::from_hms_opt(0, 0, 0)?,
        Some(t) => parse_time(t)?,
    };

    Some(date.and_time(time))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let sep = s.chars().find(|c| !c.is_ascii_digit())?;
    if !matches!(sep, '/' | '-' | '.') {
        return None;
    }

    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let (year, month, day) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        (parts[2], parts[1], parts[0])
    };

    let year: i32 = match year.len() {
        2 => {
            // Same pivot as chrono's %y: 00-69 → 20xx, 70-99 → 19xx
            let yy: i32 = year.parse().ok()?;
            if yy < 70 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        4 => year.parse().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}
