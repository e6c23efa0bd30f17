//! facegate-core — Face matching, blink liveness and record lookups.
//!
//! Detection and descriptor extraction happen behind the [`FaceAnalyzer`]
//! trait; this crate owns everything built on top of its output.

pub mod analyzer;
pub mod details;
pub mod enrollment;
pub mod liveness;
pub mod matcher;
pub mod panel;
pub mod recognition;
pub mod types;
pub mod vehicle;

pub use analyzer::{AnalyzerError, FaceAnalyzer};
pub use details::{DetailError, DetailRecord, DetailStore};
pub use liveness::{EyeOpenness, LivenessState, LivenessTracker};
pub use matcher::{BestMatch, FaceMatcher, LabeledEmbeddings};
pub use panel::PanelContent;
pub use recognition::{Recognizer, RecognizerSettings, TickGate, TickOutcome, TickTicket};
pub use types::{BoundingBox, Detection, Embedding, FaceLandmarks, FaceSample, Point};
pub use vehicle::{VehicleRecord, VehicleRegistry};
