//! Boundary to the external face inference capability.

use crate::types::{Detection, FaceSample};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("no inference output for image: {0}")]
    Unavailable(String),
    #[error("malformed inference output for {path}: {reason}")]
    Malformed { path: String, reason: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Face detection, landmarking and descriptor extraction.
///
/// `Image` is whatever the implementation consumes, typically a captured frame.
pub trait FaceAnalyzer {
    type Image;

    /// Every face in the image, in the order the backend reports them.
    fn detect_all(&mut self, image: &Self::Image) -> Result<Vec<Detection>, AnalyzerError>;

    /// The single most confident face, or `None` if there is none.
    fn detect_single(&mut self, image: &Self::Image) -> Result<Option<FaceSample>, AnalyzerError>;
}
