//! Per-channel chart series for the external renderer.

use crate::config::PipelineConfig;
use crate::core::resample::ResampledWindow;
use crate::core::types::{Channel, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One plotted point with its hover label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Bucket start of the resampled point
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub label: String,
}

/// Ordered points for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSeries {
    pub channel: Channel,
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// Build one labelled series per channel from the resampled window.
pub fn build_chart_series(window: &ResampledWindow, config: &PipelineConfig) -> Vec<ChannelSeries> {
    Channel::ALL
        .iter()
        .map(|&channel| {
            let name = config.channel(channel).display_name.clone();
            let points = window
                .iter()
                .map(|point| {
                    let value = point.observation.reading(channel);
                    ChartPoint {
                        timestamp: point.bucket_start,
                        value,
                        label: point_label(&name, value, point.bucket_start),
                    }
                })
                .collect();

            ChannelSeries {
                channel,
                name,
                points,
            }
        })
        .collect()
}

fn point_label(name: &str, value: f64, timestamp: NaiveDateTime) -> String {
    format!(
        "{name}: {value:?}°C, Date: {}",
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resample::ResampledPoint;
    use crate::core::types::Observation;
    use chrono::NaiveDate;

    #[test]
    fn test_series_per_channel_with_labels() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let window = ResampledWindow {
            points: vec![ResampledPoint {
                bucket_start: start,
                observation: Observation::new(start, [72.5, 68.0, 81.25]),
            }],
        };

        let series = build_chart_series(&window, &PipelineConfig::default());

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].name, "Temp 1");
        assert_eq!(series[2].channel, Channel::Three);
        assert_eq!(series[1].points[0].value, 68.0);
        assert_eq!(
            series[0].points[0].label,
            "Temp 1: 72.5°C, Date: 2024-03-05 14:30:00"
        );
        assert_eq!(
            series[2].points[0].label,
            "Temp3: 81.25°C, Date: 2024-03-05 14:30:00"
        );
        // Whole readings keep their decimal
        assert_eq!(
            series[1].points[0].label,
            "Temp 2: 68.0°C, Date: 2024-03-05 14:30:00"
        );
    }

    #[test]
    fn test_empty_window_gives_empty_series() {
        let series = build_chart_series(&ResampledWindow::default(), &PipelineConfig::default());
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|s| s.points.is_empty()));
    }
}
