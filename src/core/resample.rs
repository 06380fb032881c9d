//! Downsampling of the observation history into fixed-width buckets.
//!
//! Buckets are aligned to the Unix epoch, so a 10 minute bucket always starts
//! on :00, :10, :20 and so on. Each non-empty bucket keeps only its latest
//! observation; empty buckets are skipped rather than filled.

use crate::core::types::{Observation, ObservationSeries};
use chrono::{DateTime, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One non-empty bucket of the resampled window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampledPoint {
    /// Start of the bucket
    pub bucket_start: NaiveDateTime,
    /// Latest observation falling inside the bucket
    pub observation: Observation,
}

/// Tail of the bucketed history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResampledWindow {
    pub points: Vec<ResampledPoint>,
}

impl ResampledWindow {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResampledPoint> {
        self.points.iter()
    }
}

/// Start of the epoch-aligned bucket containing `timestamp`.
///
/// Returns `None` for a non-positive width or an out-of-range timestamp.
pub fn bucket_start(timestamp: NaiveDateTime, width: Duration) -> Option<NaiveDateTime> {
    let width_secs = width.num_seconds();
    if width_secs <= 0 {
        return None;
    }

    let secs = timestamp.and_utc().timestamp();
    let start = secs - secs.rem_euclid(width_secs);
    DateTime::from_timestamp(start, 0).map(|d| d.naive_utc())
}

/// Reduce the series to the last `window_size` non-empty buckets.
pub fn resample(series: &ObservationSeries, width: Duration, window_size: usize) -> ResampledWindow {
    let mut points: Vec<ResampledPoint> = Vec::new();

    for obs in series {
        let Some(start) = bucket_start(obs.timestamp, width) else {
            continue;
        };

        // The series is time-ordered, so a repeated bucket is always the last one
        match points.last_mut() {
            Some(last) if last.bucket_start == start => last.observation = *obs,
            _ => points.push(ResampledPoint {
                bucket_start: start,
                observation: *obs,
            }),
        }
    }

    let skip = points.len().saturating_sub(window_size);
    points.drain(..skip);

    ResampledWindow { points }
}
