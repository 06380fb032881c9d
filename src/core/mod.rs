//! Core pipeline for the condensate monitor.
//!
//! This module contains:
//! - Record normalization from loosely typed rows to observations
//! - Bucketed resampling for the chart window
//! - Per-channel trend forecasting and alarm evaluation
//! - Threshold breach scanning
//! - Chart series building and the end-to-end pipeline

pub mod alarm;
pub mod breach;
pub mod chart;
pub mod classifier;
pub mod forecast;
pub mod normalize;
pub mod pipeline;
pub mod resample;
pub mod types;

// Re-export commonly used types
pub use alarm::evaluate_alarm;
pub use breach::scan_breaches;
pub use chart::{build_chart_series, ChannelSeries, ChartPoint};
pub use classifier::{BinaryClassifier, FitError, LogisticRegression};
pub use forecast::{
    forecast_all, forecast_channel, Forecast, ForecastResult, IndeterminateReason, Trend,
};
pub use normalize::{normalize_records, parse_day_first, NormalizeStats};
pub use pipeline::{
    run_from_source, run_pipeline, BreachRow, DashboardReport, ForecastView, PipelineError,
};
pub use resample::{resample, ResampledPoint, ResampledWindow};
pub use types::{Channel, Observation, ObservationSeries};
