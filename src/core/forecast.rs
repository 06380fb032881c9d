//! Per-channel trend forecasting.
//!
//! For each channel, every observation except the last is labelled with
//! whether that channel's next reading is higher. A fresh classifier is fit on
//! (reading vector, label) pairs and asked about the latest reading vector.
//! Nothing is cached between runs: each call fits from the full history it is
//! given.

use crate::core::classifier::{BinaryClassifier, FeatureVector, FitError, LogisticRegression};
use crate::core::types::{Channel, ObservationSeries};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Predicted direction of the next bucketed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Rises,
    Steady,
}

/// Why a channel could not be forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndeterminateReason {
    /// Fewer than two observations, so no labels exist
    InsufficientHistory,
    /// The channel never rose, or never failed to rise
    SingleClass,
    /// The classifier could not be fit
    FitFailed,
}

/// Outcome of forecasting one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum Forecast {
    Predicted {
        trend: Trend,
        effective_at: NaiveDateTime,
    },
    Indeterminate {
        reason: IndeterminateReason,
    },
}

/// Forecast for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub channel: Channel,
    pub forecast: Forecast,
}

impl ForecastResult {
    /// Whether this forecast predicts a rise.
    pub fn rises(&self) -> bool {
        matches!(
            self.forecast,
            Forecast::Predicted {
                trend: Trend::Rises,
                ..
            }
        )
    }

    fn indeterminate(channel: Channel, reason: IndeterminateReason) -> Self {
        Self {
            channel,
            forecast: Forecast::Indeterminate { reason },
        }
    }
}

/// Rise labels for one channel: `labels[i]` is true iff reading `i + 1` is
/// strictly greater than reading `i`. The last observation gets no label.
pub fn rise_labels(series: &ObservationSeries, channel: Channel) -> Vec<bool> {
    series
        .as_slice()
        .windows(2)
        .map(|pair| pair[1].reading(channel) > pair[0].reading(channel))
        .collect()
}

/// Forecast one channel with a freshly fit classifier of type `C`.
///
/// `horizon` is added to the last observation's timestamp to give the
/// forecast's effective time.
pub fn forecast_channel<C>(
    series: &ObservationSeries,
    channel: Channel,
    horizon: Duration,
) -> ForecastResult
where
    C: BinaryClassifier + Default,
{
    let Some(last) = series.last() else {
        return ForecastResult::indeterminate(channel, IndeterminateReason::InsufficientHistory);
    };

    let labels = rise_labels(series, channel);
    if labels.is_empty() {
        return ForecastResult::indeterminate(channel, IndeterminateReason::InsufficientHistory);
    }

    let features: Vec<FeatureVector> = series
        .iter()
        .take(labels.len())
        .map(|o| o.readings)
        .collect();

    let mut model = C::default();
    match model.fit(&features, &labels) {
        Ok(()) => {}
        Err(FitError::SingleClass) => {
            tracing::debug!(%channel, "single label class, cannot forecast");
            return ForecastResult::indeterminate(channel, IndeterminateReason::SingleClass);
        }
        Err(e) => {
            tracing::warn!(%channel, error = %e, "classifier fit failed");
            return ForecastResult::indeterminate(channel, IndeterminateReason::FitFailed);
        }
    }

    let Some(rises) = model.predict(&last.readings) else {
        return ForecastResult::indeterminate(channel, IndeterminateReason::FitFailed);
    };
    let Some(effective_at) = last.timestamp.checked_add_signed(horizon) else {
        tracing::warn!(%channel, "forecast horizon overflows the timestamp range");
        return ForecastResult::indeterminate(channel, IndeterminateReason::FitFailed);
    };

    ForecastResult {
        channel,
        forecast: Forecast::Predicted {
            trend: if rises { Trend::Rises } else { Trend::Steady },
            effective_at,
        },
    }
}

/// Forecast every channel with logistic regression.
///
/// Channels share nothing, so each is fit on its own scoped thread; all three
/// finish before this returns.
pub fn forecast_all(series: &ObservationSeries, horizon: Duration) -> Vec<ForecastResult> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = Channel::ALL
            .iter()
            .map(|&channel| {
                (
                    channel,
                    scope.spawn(move || {
                        forecast_channel::<LogisticRegression>(series, channel, horizon)
                    }),
                )
            })
            .collect();

        handles
            .into_iter()
            .map(|(channel, handle)| {
                handle.join().unwrap_or_else(|_| {
                    tracing::error!(%channel, "forecast thread panicked");
                    ForecastResult::indeterminate(channel, IndeterminateReason::FitFailed)
                })
            })
            .collect()
    })
}
