//! Condensate Monitor - temperature trend forecasting for tank sensors.
//!
//! This library turns raw sensor rows from three temperature channels into a
//! dashboard report: a resampled chart window, a one-step trend forecast per
//! channel, an alarm flag, and the most recent threshold breaches.
//!
//! # Guarantees
//!
//! - **No partial rows**: a row with any unparseable field is dropped whole
//! - **Stateless runs**: every run refits its classifiers from the rows it is given
//! - **No shared series**: concurrent runs never share or mutate each other's data
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Condensate Monitor                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ Row Source  │──▶│  Normalize  │──▶│  Resample   │──▶ chart│
//! │  │ (file/http) │   │ (day-first) │   │ (10 min)    │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                           │                                 │
//! │                           ├──────────▶ Forecast ──▶ Alarm   │
//! │                           └──────────▶ Breaches             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use condensate_monitor::{config::PipelineConfig, core::run_from_source, source::FileSource};
//!
//! let source = FileSource::new("records.json");
//! let report = run_from_source(&source, &PipelineConfig::default()).expect("source unavailable");
//! println!("{}", report.summary());
//! ```

pub mod config;
pub mod core;
pub mod source;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{ChannelSpec, Config, ConfigError, PipelineConfig, SourceConfig};
pub use crate::core::{
    run_from_source, run_pipeline, Channel, DashboardReport, ForecastResult, Observation,
    ObservationSeries, PipelineError,
};
pub use source::{FileSource, RawRecord, RowSource, SourceError, StaticSource};

#[cfg(feature = "remote")]
pub use source::{RemoteConfig, RemoteSource};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
