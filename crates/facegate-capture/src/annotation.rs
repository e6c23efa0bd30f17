//! Face analyzer backed by annotation sidecars.
//!
//! The inference library runs out of process and writes its results next to
//! each image: `frame_0001.png` is described by `frame_0001.json`. The
//! sidecar holds either a bare array of detections or an object with a
//! `detections` array. A missing sidecar means the image has no faces.

use crate::frame::Frame;
use facegate_core::{AnalyzerError, Detection, FaceAnalyzer, FaceSample};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(untagged)]
enum Sidecar {
    List(Vec<Detection>),
    Wrapped { detections: Vec<Detection> },
}

impl Sidecar {
    fn into_detections(self) -> Vec<Detection> {
        match self {
            Self::List(d) | Self::Wrapped { detections: d } => d,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotationAnalyzer;

impl AnnotationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn sidecar_path(image: &Path) -> PathBuf {
        image.with_extension("json")
    }

    fn read(&self, frame: &Frame) -> Result<Vec<Detection>, AnalyzerError> {
        let source = frame
            .source
            .as_deref()
            .ok_or_else(|| AnalyzerError::Unavailable(format!("frame #{}", frame.sequence)))?;
        let path = Self::sidecar_path(source);

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::trace!(path = %path.display(), "no sidecar; treating as faceless");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let sidecar: Sidecar =
            serde_json::from_slice(&bytes).map_err(|e| AnalyzerError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(sidecar.into_detections())
    }
}

impl FaceAnalyzer for AnnotationAnalyzer {
    type Image = Frame;

    fn detect_all(&mut self, image: &Frame) -> Result<Vec<Detection>, AnalyzerError> {
        self.read(image)
    }

    fn detect_single(&mut self, image: &Frame) -> Result<Option<FaceSample>, AnalyzerError> {
        let best = self
            .read(image)?
            .into_iter()
            .max_by(|a, b| a.score.unwrap_or(0.0).total_cmp(&b.score.unwrap_or(0.0)));
        Ok(best.map(Detection::into_sample))
    }
}
