//! In-memory row source.

use super::{RawRecord, RowSource, SourceError};

/// A source that always returns the same rows.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rows: Vec<RawRecord>,
}

impl StaticSource {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }
}

impl RowSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        Ok(self.rows.clone())
    }
}
