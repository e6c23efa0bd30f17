//! facegate-capture — Frame acquisition and the annotation-backed analyzer.
//!
//! Frames come from a replayed image sequence; face inference results are
//! read from JSON sidecars produced by an external inference process.

pub mod annotation;
pub mod frame;
pub mod source;

pub use annotation::AnnotationAnalyzer;
pub use frame::{Frame, FrameError};
pub use source::{CaptureError, FrameSource, ImageSequence};
