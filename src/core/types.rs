//! Typed observation model for the tank temperature pipeline.
//!
//! Raw rows only become [`Observation`]s after validation, so every value
//! here is fully populated and finite.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Display format used for timestamps in reports and breach rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One of the three temperature channels tracked per observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    One,
    Two,
    Three,
}

impl Channel {
    /// All channels in column order.
    pub const ALL: [Channel; 3] = [Channel::One, Channel::Two, Channel::Three];

    /// Position of this channel in an observation's reading vector.
    pub fn index(self) -> usize {
        match self {
            Channel::One => 0,
            Channel::Two => 1,
            Channel::Three => 2,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel {}", self.index() + 1)
    }
}

/// One validated sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Local (timezone-naive) sample time
    pub timestamp: NaiveDateTime,
    /// Readings in °C, indexed by [`Channel::index`]
    pub readings: [f64; 3],
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, readings: [f64; 3]) -> Self {
        Self {
            timestamp,
            readings,
        }
    }

    /// Reading for a single channel.
    pub fn reading(&self, channel: Channel) -> f64 {
        self.readings[channel.index()]
    }

    /// Whether any channel strictly exceeds `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.readings.iter().any(|&r| r > threshold)
    }
}

/// Time-ordered sequence of observations produced by one pipeline run.
///
/// Timestamps are non-decreasing; equal timestamps keep their source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    /// Build a series, stably sorting by timestamp.
    pub fn from_unsorted(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        Self { observations }
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Most recent observation, if any.
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }
}

impl<'a> IntoIterator for &'a ObservationSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_series_sort_is_stable() {
        let series = ObservationSeries::from_unsorted(vec![
            Observation::new(at(10), [1.0, 0.0, 0.0]),
            Observation::new(at(5), [2.0, 0.0, 0.0]),
            Observation::new(at(10), [3.0, 0.0, 0.0]),
        ]);

        let firsts: Vec<f64> = series.iter().map(|o| o.reading(Channel::One)).collect();
        assert_eq!(firsts, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_exceeds_is_strict() {
        let obs = Observation::new(at(0), [80.0, 80.0, 80.0]);
        assert!(!obs.exceeds(80.0));

        let obs = Observation::new(at(0), [70.0, 80.5, 60.0]);
        assert!(obs.exceeds(80.0));
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Three.to_string(), "channel 3");
        assert_eq!(Channel::Two.index(), 1);
    }
}
