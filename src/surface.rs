//! Access to a listing's rendered document.

use crate::error::{AppError, Result};
use scraper::Html;
use std::path::PathBuf;

/// A source of DOM snapshots for one listing visit.
///
/// The scraping host (live browser session, capture pipeline) sits behind
/// this trait; the discovery pipeline only ever asks for the current
/// snapshot and for a best-effort expansion of collapsed sections between
/// harvest passes.
pub(crate) trait ListingSurface {
    /// Human-readable identifier for log and error messages.
    fn label(&self) -> String;

    /// Parses and returns the current state of the listing document.
    fn snapshot(&mut self) -> Result<Html>;

    /// Attempts to expand collapsed content, returning how many controls
    /// were activated. Static snapshots cannot expand anything.
    fn expand_collapsed(&mut self) -> usize {
        0
    }
}

/// A listing surface backed by a captured HTML file.
pub(crate) struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ListingSurface for SnapshotFile {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn snapshot(&mut self) -> Result<Html> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::Surface(format!(
                "cannot read listing snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Html::parse_document(&raw))
    }
}

/// In-memory surface for tests.
#[cfg(test)]
pub(crate) struct StaticSnapshot {
    pub html: String,
}

#[cfg(test)]
impl ListingSurface for StaticSnapshot {
    fn label(&self) -> String {
        "static snapshot".to_string()
    }

    fn snapshot(&mut self) -> Result<Html> {
        Ok(Html::parse_document(&self.html))
    }
}
