//! Remote tabular store reached by sheet name.
//!
//! The store exposes `GET {base_url}/sheets/{sheet}/records`, returning every
//! row of the sheet as a JSON array of objects. Requests carry a bearer token.

use super::{RawRecord, RowSource, SourceError};
use std::time::Duration;

/// Remote store configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Store base URL, e.g. `https://sheets.example.com/api`
    pub base_url: String,
    /// Sheet name (may contain spaces)
    pub sheet: String,
    /// Bearer authentication token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Create a new remote configuration with a 10 second timeout.
    pub fn new(base_url: impl Into<String>, sheet: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            sheet: sheet.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Full URL of the sheet's records endpoint.
    pub fn records_url(&self) -> Result<reqwest::Url, SourceError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SourceError::Config(format!("Invalid base URL '{}': {e}", self.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| SourceError::Config(format!("Base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(["sheets", self.sheet.as_str(), "records"]);

        Ok(url)
    }
}

/// Fetches rows from the remote store.
///
/// Each fetch builds its own client and single-threaded runtime, so the source
/// holds no connection state between runs and can be called from any
/// blocking context.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    config: RemoteConfig,
    name: String,
}

impl RemoteSource {
    pub fn new(config: RemoteConfig) -> Self {
        let name = format!("remote:{}", config.sheet);
        Self { config, name }
    }

    /// Fetch all rows asynchronously.
    pub async fn fetch_async(&self) -> Result<Vec<RawRecord>, SourceError> {
        let url = self.config.records_url()?;
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let response = client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<RawRecord>>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

impl RowSource for RemoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SourceError::Config(format!("Failed to create runtime: {e}")))?;

        runtime.block_on(self.fetch_async())
    }
}
