//! Threshold breach scanning over the full observation history.

use crate::core::types::{Observation, ObservationSeries};

/// Most recent observations with any channel strictly above `threshold`.
///
/// Returns at most `limit` observations, newest first. Observations sharing a
/// timestamp keep their reverse source order.
pub fn scan_breaches(series: &ObservationSeries, threshold: f64, limit: usize) -> Vec<Observation> {
    series
        .iter()
        .rev()
        .filter(|o| o.exceeds(threshold))
        .take(limit)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    #[test]
    fn test_threshold_is_strict() {
        let series = ObservationSeries::from_unsorted(vec![
            Observation::new(at(0), [80.0, 80.0, 80.0]),
            Observation::new(at(1), [70.0, 80.1, 70.0]),
            Observation::new(at(2), [70.0, 70.0, 70.0]),
        ]);

        let breaches = scan_breaches(&series, 80.0, 10);

        assert_eq!(breaches.len(), 1);
        assert_eq!(breaches[0].timestamp, at(1));
    }

    #[test]
    fn test_newest_first_and_capped() {
        let series = ObservationSeries::from_unsorted(
            (0..25)
                .map(|i| Observation::new(at(i), [70.0, 70.0, if i % 2 == 0 { 85.0 } else { 75.0 }]))
                .collect(),
        );

        let breaches = scan_breaches(&series, 80.0, 10);

        assert_eq!(breaches.len(), 10);
        assert_eq!(breaches[0].timestamp, at(24));
        assert_eq!(breaches[9].timestamp, at(6));
        assert!(breaches.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_no_breaches() {
        let series = ObservationSeries::from_unsorted(vec![Observation::new(at(0), [1.0, 2.0, 3.0])]);
        assert!(scan_breaches(&series, 80.0, 10).is_empty());
        assert!(scan_breaches(&ObservationSeries::default(), 80.0, 10).is_empty());
    }
}
