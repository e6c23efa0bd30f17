//! Blink-based liveness gate.
//!
//! Eye openness is measured from the six-point eye contour of the 68-point
//! landmark scheme:
//!
//! ```text
//!        p1  p2
//!   p0            p3
//!        p5  p4
//! ```
//!
//! `openness = (|p1.y - p5.y| + |p2.y - p4.y|) / (2 * |p0.x - p3.x|)`
//!
//! The ratio is dimensionless, so uniformly scaling the landmarks leaves it
//! unchanged. Only the left eye feeds the blink decision; the right-eye ratio
//! is reported for diagnostics.
//!
//! Once a label has been confirmed by a blink it stays confirmed until a
//! different label is confirmed in its place. A tick that matches some other
//! label without a blink asks for a blink but keeps the earlier confirmation,
//! so one noisy frame does not force the same person to blink again:
//!
//! | state                                     | event              | next                                     |
//! |-------------------------------------------|--------------------|------------------------------------------|
//! | any                                       | blink, label L     | `Confirmed(L)`                           |
//! | `Confirmed(L)` or pending with `Some(L)`  | no blink, label L  | `Confirmed(L)`                           |
//! | `Confirmed(C)`, C != L                    | no blink, label L  | `PendingBlink { L, confirmed: Some(C) }` |
//! | `PendingBlink { confirmed: c, .. }`       | no blink, label L  | `PendingBlink { L, confirmed: c }`       |
//! | `Idle`                                    | no blink, label L  | `PendingBlink { L, confirmed: None }`    |
//!
//! Ticks without a face never reach the tracker and leave the state as is.

use crate::types::{FaceLandmarks, Point};

/// Openness below which the eye counts as closed.
pub const DEFAULT_BLINK_THRESHOLD: f32 = 1.0;

/// Openness ratio for a six-point eye contour.
///
/// Returns `None` when fewer than six points are given or the eye has no
/// horizontal extent.
pub fn eye_openness(eye: &[Point]) -> Option<f32> {
    let [p0, p1, p2, p3, p4, p5] = eye.get(..6)? else {
        return None;
    };
    let vertical = (p1.y - p5.y).abs() + (p2.y - p4.y).abs();
    let horizontal = (p0.x - p3.x).abs();
    if horizontal <= f32::EPSILON {
        return None;
    }
    Some(vertical / (2.0 * horizontal))
}

/// Openness of both eyes for one detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOpenness {
    pub left: Option<f32>,
    pub right: Option<f32>,
}

impl EyeOpenness {
    pub fn measure(landmarks: &FaceLandmarks) -> Self {
        Self {
            left: landmarks.left_eye().and_then(eye_openness),
            right: landmarks.right_eye().and_then(eye_openness),
        }
    }

    /// Blink decision from the left eye alone.
    pub fn is_blinking(&self, threshold: f32) -> bool {
        matches!(self.left, Some(ratio) if ratio < threshold)
    }
}

/// Liveness state carried across recognition ticks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LivenessState {
    #[default]
    Idle,
    /// A face matched `label` but no blink has been seen for it yet.
    /// `confirmed` keeps the last label a blink was seen for.
    PendingBlink {
        label: String,
        confirmed: Option<String>,
    },
    /// A blink was seen while this label matched.
    Confirmed(String),
}

impl LivenessState {
    /// Label the state currently refers to, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::PendingBlink { label, .. } | Self::Confirmed(label) => Some(label.as_str()),
        }
    }

    /// Label whose liveness has been confirmed by a blink, if any.
    pub fn confirmed(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::PendingBlink { confirmed, .. } => confirmed.as_deref(),
            Self::Confirmed(label) => Some(label.as_str()),
        }
    }
}

/// Owns the single liveness slot and applies the transition table.
#[derive(Debug, Clone, Default)]
pub struct LivenessTracker {
    state: LivenessState,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LivenessState {
        &self.state
    }

    /// Feed one face observation. Returns true when the label is confirmed live.
    pub fn observe(&mut self, label: &str, blinked: bool) -> bool {
        let already = self.state.confirmed() == Some(label);
        if blinked || already {
            if !already {
                tracing::info!(label, "liveness confirmed");
            }
            self.state = LivenessState::Confirmed(label.to_string());
            true
        } else {
            let confirmed = self.state.confirmed().map(str::to_string);
            self.state = LivenessState::PendingBlink {
                label: label.to_string(),
                confirmed,
            };
            false
        }
    }
}
