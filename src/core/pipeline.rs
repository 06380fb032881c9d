//! End-to-end pipeline: raw rows to dashboard report.
//!
//! ```text
//! rows ─▶ normalize ─▶ series ─┬─▶ resample ─▶ chart series
//!                              ├─▶ forecast ─▶ alarm
//!                              └─▶ breaches
//! ```
//!
//! Every run starts from freshly fetched rows and shares nothing with other
//! runs, so concurrent requests each get their own series.

use crate::config::{ConfigError, PipelineConfig};
use crate::core::alarm::evaluate_alarm;
use crate::core::breach::scan_breaches;
use crate::core::chart::{build_chart_series, ChannelSeries};
use crate::core::forecast::{forecast_all, Forecast, ForecastResult, IndeterminateReason, Trend};
use crate::core::normalize::{normalize_records, NormalizeStats};
use crate::core::resample::resample;
use crate::core::types::{Channel, Observation, TIMESTAMP_FORMAT};
use crate::source::{RawRecord, RowSource, SourceError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Placeholder shown when a forecast has no effective time.
pub const NO_DATE: &str = "---";

/// A breach as a plain field/value row, keyed by the configured field names.
pub type BreachRow = Map<String, Value>;

/// Forecast rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub channel_name: String,
    /// "Rises", "No rise" or "Cannot predict"
    pub forecast_text: String,
    /// Effective time, or "---" when indeterminate
    pub effective_at_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IndeterminateReason>,
}

/// Everything the presentation layer needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub chart: Vec<ChannelSeries>,
    pub breaches: Vec<BreachRow>,
    pub alarm: bool,
    pub forecasts: Vec<ForecastView>,
    pub stats: NormalizeStats,
}

impl DashboardReport {
    /// Plain-text rendering for terminals.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Run {} at {}\n",
            self.run_id,
            self.generated_at.format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!(
            "Rows: {} received, {} kept, {} dropped\n\n",
            self.stats.rows_received,
            self.stats.rows_kept,
            self.stats.rows_dropped()
        ));

        out.push_str(&format!(
            "Alarm: {}\n\n",
            if self.alarm { "ACTIVE (rise forecast)" } else { "clear" }
        ));

        out.push_str("Forecasts:\n");
        for f in &self.forecasts {
            out.push_str(&format!(
                "  {:<12} {:<15} {}\n",
                f.channel_name, f.forecast_text, f.effective_at_text
            ));
        }

        out.push_str(&format!("\nRecent breaches ({}):\n", self.breaches.len()));
        if self.breaches.is_empty() {
            out.push_str("  none\n");
        }
        for row in &self.breaches {
            let fields: Vec<String> = row.iter().map(|(k, v)| format!("{k}={v}")).collect();
            out.push_str(&format!("  {}\n", fields.join(", ")));
        }

        out.push_str("\nChart window:\n");
        for series in &self.chart {
            let values: Vec<String> = series.points.iter().map(|p| p.value.to_string()).collect();
            out.push_str(&format!("  {:<12} [{}]\n", series.name, values.join(", ")));
        }

        out
    }
}

/// Pipeline failures surfaced to the caller.
#[derive(Debug)]
pub enum PipelineError {
    /// The row source could not be read
    Source(SourceError),
    /// The pipeline configuration is unusable
    Config(ConfigError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Source(e) => write!(f, "Source unavailable: {e}"),
            PipelineError::Config(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Source(e) => Some(e),
            PipelineError::Config(e) => Some(e),
        }
    }
}

impl From<SourceError> for PipelineError {
    fn from(e: SourceError) -> Self {
        PipelineError::Source(e)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

/// Run the whole pipeline over already-fetched rows.
pub fn run_pipeline(records: &[RawRecord], config: &PipelineConfig) -> DashboardReport {
    let (series, stats) = normalize_records(records, config);

    let window = resample(&series, config.bucket_span(), config.window_size);
    let forecasts = forecast_all(&series, config.bucket_span());
    let breaches = scan_breaches(&series, config.breach_threshold, config.breach_limit);
    let alarm = evaluate_alarm(&forecasts);
    let chart = build_chart_series(&window, config);

    tracing::info!(
        rows = stats.rows_received,
        kept = stats.rows_kept,
        dropped = stats.rows_dropped(),
        buckets = window.len(),
        breaches = breaches.len(),
        alarm,
        "pipeline run complete"
    );

    DashboardReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        chart,
        breaches: breaches.iter().map(|o| breach_row(o, config)).collect(),
        alarm,
        forecasts: forecasts.iter().map(|f| forecast_view(f, config)).collect(),
        stats,
    }
}

/// Fetch rows from `source` and run the pipeline over them.
pub fn run_from_source(
    source: &dyn RowSource,
    config: &PipelineConfig,
) -> Result<DashboardReport, PipelineError> {
    config.validate()?;

    let records = source.fetch().map_err(|e| {
        tracing::error!(source = source.name(), error = %e, "failed to fetch rows");
        e
    })?;
    tracing::debug!(source = source.name(), rows = records.len(), "fetched rows");

    Ok(run_pipeline(&records, config))
}

/// Render a breach observation as a field/value row.
pub fn breach_row(obs: &Observation, config: &PipelineConfig) -> BreachRow {
    let mut row = Map::new();
    row.insert(
        config.timestamp_field.trim().to_string(),
        Value::String(obs.timestamp.format(TIMESTAMP_FORMAT).to_string()),
    );
    for channel in Channel::ALL {
        row.insert(
            config.channel(channel).field.trim().to_string(),
            Value::from(obs.reading(channel)),
        );
    }
    row
}

/// Render a forecast for display.
pub fn forecast_view(result: &ForecastResult, config: &PipelineConfig) -> ForecastView {
    let channel_name = config.channel(result.channel).display_name.clone();

    match result.forecast {
        Forecast::Predicted {
            trend,
            effective_at,
        } => ForecastView {
            channel_name,
            forecast_text: match trend {
                Trend::Rises => "Rises",
                Trend::Steady => "No rise",
            }
            .to_string(),
            effective_at_text: effective_at.format(TIMESTAMP_FORMAT).to_string(),
            reason: None,
        },
        Forecast::Indeterminate { reason } => ForecastView {
            channel_name,
            forecast_text: "Cannot predict".to_string(),
            effective_at_text: NO_DATE.to_string(),
            reason: Some(reason),
        },
    }
}
