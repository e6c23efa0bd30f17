//! Per-label detail records, read fresh from disk on every lookup.

use crate::panel::PanelContent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetailError {
    #[error("no detail record at {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed detail record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Student record shown once a face is recognized and confirmed live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub name: String,
    pub course: String,
    pub status: String,
    pub college: String,
    #[serde(rename = "rollnumber")]
    pub roll_number: String,
    #[serde(rename = "examform")]
    pub exam_form: String,
}

impl DetailRecord {
    pub fn from_json(bytes: &[u8]) -> Result<Self, DetailError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn panel(&self) -> PanelContent {
        PanelContent::Fields(vec![
            ("Name", self.name.clone()),
            ("Course", self.course.clone()),
            ("Status", self.status.clone()),
            ("College", self.college.clone()),
            ("Roll Number", self.roll_number.clone()),
            ("Exam Form", self.exam_form.clone()),
        ])
    }
}

/// Reads `<root>/<label>/details.json`.
#[derive(Debug, Clone)]
pub struct DetailStore {
    root: PathBuf,
}

impl DetailStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        self.root.join(label).join("details.json")
    }

    /// Fetch and decode the record for `label`. No caching, no retry.
    pub async fn fetch(&self, label: &str) -> Result<DetailRecord, DetailError> {
        let path = self.path_for(label);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DetailError::NotFound(path));
            }
            Err(source) => return Err(DetailError::Io { path, source }),
        };
        DetailRecord::from_json(&bytes)
    }

    /// Fetch and turn the outcome into panel content; failures become the
    /// "no details" message.
    pub async fn render(&self, label: &str) -> PanelContent {
        match self.fetch(label).await {
            Ok(record) => record.panel(),
            Err(e) => {
                tracing::warn!(label, error = %e, "detail fetch failed");
                PanelContent::no_details(label)
            }
        }
    }
}
