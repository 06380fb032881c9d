//! Rows stored on disk as a JSON array of objects.

use super::{parse_records, RawRecord, RowSource, SourceError};
use std::path::PathBuf;

/// Reads rows from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl RowSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))?;
        parse_records(&content)
    }
}
