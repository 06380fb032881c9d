//! Raw row sources for the condensate monitor.
//!
//! A source hands back loosely typed rows exactly as the upstream store
//! returns them; all validation happens later in the pipeline. Fetch failures
//! are fatal for a run and are reported to the caller as [`SourceError`].

pub mod file;
pub mod memory;

#[cfg(feature = "remote")]
pub mod remote;

pub use file::FileSource;
pub use memory::StaticSource;

#[cfg(feature = "remote")]
pub use remote::{RemoteConfig, RemoteSource};

use crate::config::SourceConfig;

/// One loosely typed row: field name to string or primitive value.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A provider of raw rows.
pub trait RowSource {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Fetch every row currently held by the source.
    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError>;
}

/// Row source error types.
#[derive(Debug)]
pub enum SourceError {
    /// Local read error
    Io(String),
    /// Rows could not be decoded
    Parse(String),
    /// Network/HTTP error
    Network(String),
    /// Remote store returned an error response
    Server { status: u16, message: String },
    /// Source is misconfigured or unsupported in this build
    Config(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Io(msg) => write!(f, "Source read error: {msg}"),
            SourceError::Parse(msg) => write!(f, "Source parse error: {msg}"),
            SourceError::Network(msg) => write!(f, "Source network error: {msg}"),
            SourceError::Server { status, message } => {
                write!(f, "Source server error ({status}): {message}")
            }
            SourceError::Config(msg) => write!(f, "Source config error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Build the row source described by the configuration.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn RowSource + Send + Sync>, SourceError> {
    match config {
        SourceConfig::File { path } => Ok(Box::new(FileSource::new(path.clone()))),
        #[cfg(feature = "remote")]
        SourceConfig::Remote {
            base_url,
            sheet,
            token,
        } => Ok(Box::new(RemoteSource::new(RemoteConfig::new(
            base_url.clone(),
            sheet.clone(),
            token.clone(),
        )))),
        #[cfg(not(feature = "remote"))]
        SourceConfig::Remote { .. } => Err(SourceError::Config(
            "remote sources require the `remote` feature".to_string(),
        )),
    }
}

/// Decode a JSON array of row objects.
pub fn parse_records(json: &str) -> Result<Vec<RawRecord>, SourceError> {
    serde_json::from_str(json).map_err(|e| SourceError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_records() {
        let rows = parse_records(r#"[{"FechaHora": "05/03/2024 14:30", "Temp 1": 70}, {}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Temp 1"], 70);

        assert!(matches!(
            parse_records(r#"{"not": "an array"}"#),
            Err(SourceError::Parse(_))
        ));
        assert!(matches!(parse_records("[1, 2]"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_from_config_file() {
        let source = from_config(&SourceConfig::File {
            path: PathBuf::from("rows.json"),
        })
        .unwrap();
        assert_eq!(source.name(), "rows.json");
    }

    #[cfg(not(feature = "remote"))]
    #[test]
    fn test_from_config_remote_requires_feature() {
        let result = from_config(&SourceConfig::Remote {
            base_url: "http://127.0.0.1:1".to_string(),
            sheet: "prueba 2".to_string(),
            token: "t".to_string(),
        });
        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Server {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(err.to_string(), "Source server error (503): down");
    }
}
