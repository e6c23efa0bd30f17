//! Per-tick recognition decision: match, blink gate and overlay box.
//!
//! Ticks are numbered by a [`TickGate`] at the moment their frame is
//! captured. A tick's result is only applied if no later-numbered tick has
//! already been applied, so a slow tick can never overwrite the liveness
//! state or the panel with data older than what is already shown.

use crate::liveness::{EyeOpenness, LivenessState, LivenessTracker, DEFAULT_BLINK_THRESHOLD};
use crate::matcher::{BestMatch, FaceMatcher};
use crate::panel::{PanelContent, NOT_RECOGNIZED, NO_FACE, PLEASE_BLINK};
use crate::types::{BoundingBox, Detection};
use std::sync::atomic::{AtomicU64, Ordering};

/// Horizontal shift applied to the drawn face box, in display pixels.
pub const DEFAULT_BOX_OFFSET_X: f32 = -125.0;
/// Vertical shift applied to the drawn face box, in display pixels.
pub const DEFAULT_BOX_OFFSET_Y: f32 = 0.0;

/// Sequence number handed to a tick when its frame is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TickTicket(u64);

impl TickTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Monotonic tick numbering, owned by whoever hands out frames.
#[derive(Debug, Default)]
pub struct TickGate {
    dispatched: AtomicU64,
}

impl TickGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self) -> TickTicket {
        TickTicket(self.dispatched.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest_dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::SeqCst)
    }
}

/// Outcome of one applied tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    NoFace,
    AwaitingBlink {
        best: BestMatch,
        eyes: EyeOpenness,
    },
    Confirmed {
        best: BestMatch,
        eyes: EyeOpenness,
        /// Face box with the overlay offset already applied.
        overlay: BoundingBox,
    },
}

impl TickOutcome {
    /// Panel text known without a detail fetch. `None` means the matched
    /// label's detail record should be fetched and shown.
    pub fn status(&self) -> Option<PanelContent> {
        match self {
            Self::NoFace => Some(PanelContent::text(NO_FACE)),
            Self::AwaitingBlink { .. } => Some(PanelContent::text(PLEASE_BLINK)),
            Self::Confirmed { best, .. } if best.is_unknown() => {
                Some(PanelContent::text(NOT_RECOGNIZED))
            }
            Self::Confirmed { .. } => None,
        }
    }

    /// Label whose detail record should be fetched, if any.
    pub fn detail_label(&self) -> Option<&str> {
        match self {
            Self::Confirmed { best, .. } if !best.is_unknown() => Some(best.label.as_str()),
            _ => None,
        }
    }

    /// Box and caption to draw on the overlay, if any.
    pub fn overlay(&self) -> Option<(BoundingBox, String)> {
        match self {
            Self::Confirmed { best, overlay, .. } => Some((*overlay, best.to_string())),
            _ => None,
        }
    }
}

/// Tunables for [`Recognizer`].
#[derive(Debug, Clone, Copy)]
pub struct RecognizerSettings {
    pub blink_threshold: f32,
    pub box_offset: (f32, f32),
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            box_offset: (DEFAULT_BOX_OFFSET_X, DEFAULT_BOX_OFFSET_Y),
        }
    }
}

/// Matcher plus the liveness slot carried between ticks.
pub struct Recognizer {
    matcher: FaceMatcher,
    liveness: LivenessTracker,
    settings: RecognizerSettings,
    last_applied: u64,
}

impl Recognizer {
    pub fn new(matcher: FaceMatcher, settings: RecognizerSettings) -> Self {
        Self {
            matcher,
            liveness: LivenessTracker::new(),
            settings,
            last_applied: 0,
        }
    }

    pub fn liveness(&self) -> &LivenessState {
        self.liveness.state()
    }

    pub fn matcher(&self) -> &FaceMatcher {
        &self.matcher
    }

    /// True while `ticket` is the most recently applied tick.
    pub fn is_current(&self, ticket: TickTicket) -> bool {
        self.last_applied == ticket.0
    }

    /// Apply one tick's detections. Returns `None` when a later tick has
    /// already been applied; the stale result is dropped untouched.
    pub fn apply(&mut self, ticket: TickTicket, detections: &[Detection]) -> Option<TickOutcome> {
        if ticket.0 <= self.last_applied {
            tracing::debug!(
                tick = ticket.0,
                applied = self.last_applied,
                "discarding stale tick"
            );
            return None;
        }
        self.last_applied = ticket.0;
        Some(self.evaluate(detections))
    }

    fn evaluate(&mut self, detections: &[Detection]) -> TickOutcome {
        let Some(face) = detections.first() else {
            return TickOutcome::NoFace;
        };

        let eyes = EyeOpenness::measure(&face.landmarks);
        let blinked = eyes.is_blinking(self.settings.blink_threshold);
        let best = self.matcher.best_match(&face.descriptor);

        tracing::debug!(
            label = %best.label,
            distance = best.distance,
            left_eye = ?eyes.left,
            right_eye = ?eyes.right,
            blinked,
            "face evaluated"
        );

        if !self.liveness.observe(&best.label, blinked) {
            return TickOutcome::AwaitingBlink { best, eyes };
        }

        let (dx, dy) = self.settings.box_offset;
        TickOutcome::Confirmed {
            overlay: face.bbox.offset(dx, dy),
            best,
            eyes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{LabeledEmbeddings, DEFAULT_DISTANCE_THRESHOLD};
    use crate::types::{Embedding, FaceLandmarks, Point};

    /// Detection whose left eye openness equals `half_height / 5` (width 10).
    fn detection(descriptor: &[f32], half_height: f32) -> Detection {
        let mut points = vec![Point::new(0.0, 0.0); 68];
        let eye = [
            Point::new(0.0, 0.0),
            Point::new(3.0, -half_height),
            Point::new(7.0, -half_height),
            Point::new(10.0, 0.0),
            Point::new(7.0, half_height),
            Point::new(3.0, half_height),
        ];
        points[36..42].copy_from_slice(&eye);
        points[42..48].copy_from_slice(&eye);
        Detection {
            bbox: BoundingBox { x: 300.0, y: 120.0, width: 100.0, height: 110.0 },
            score: Some(0.9),
            landmarks: FaceLandmarks::new(points),
            descriptor: Embedding::new(descriptor.to_vec()),
        }
    }

    const BLINK: f32 = 2.0; // openness 0.4
    const OPEN: f32 = 6.0; // openness 1.2

    fn recognizer() -> Recognizer {
        let matcher = FaceMatcher::new(
            vec![
                LabeledEmbeddings::new("Elon", vec![Embedding::new(vec![0.0, 0.0])]),
                LabeledEmbeddings::new("Saqib", vec![Embedding::new(vec![1.0, 1.0])]),
            ],
            DEFAULT_DISTANCE_THRESHOLD,
        );
        Recognizer::new(matcher, RecognizerSettings::default())
    }

    #[test]
    fn test_no_face_leaves_state_untouched() {
        let gate = TickGate::new();
        let mut r = recognizer();
        r.apply(gate.dispatch(), &[detection(&[0.0, 0.0], BLINK)]);
        let before = r.liveness().clone();

        let outcome = r.apply(gate.dispatch(), &[]).unwrap();
        assert_eq!(outcome, TickOutcome::NoFace);
        assert_eq!(outcome.status(), Some(PanelContent::text("No face detected.")));
        assert_eq!(r.liveness(), &before);
    }

    #[test]
    fn test_blink_then_open_stays_confirmed() {
        let gate = TickGate::new();
        let mut r = recognizer();

        let first = r.apply(gate.dispatch(), &[detection(&[0.0, 0.0], BLINK)]).unwrap();
        assert!(matches!(first, TickOutcome::Confirmed { .. }));
        assert_eq!(r.liveness(), &LivenessState::Confirmed("Elon".into()));

        let second = r.apply(gate.dispatch(), &[detection(&[0.05, 0.0], OPEN)]).unwrap();
        assert_eq!(second.detail_label(), Some("Elon"));
        assert_eq!(r.liveness(), &LivenessState::Confirmed("Elon".into()));
    }

    #[test]
    fn test_unknown_frame_does_not_revoke_confirmation() {
        let gate = TickGate::new();
        let mut r = recognizer();
        r.apply(gate.dispatch(), &[detection(&[0.0, 0.0], BLINK)]);

        let noisy = r.apply(gate.dispatch(), &[detection(&[9.0, 9.0], OPEN)]).unwrap();
        assert!(matches!(noisy, TickOutcome::AwaitingBlink { .. }));

        let back = r.apply(gate.dispatch(), &[detection(&[0.0, 0.0], OPEN)]).unwrap();
        assert!(matches!(back, TickOutcome::Confirmed { .. }));
        assert_eq!(back.detail_label(), Some("Elon"));
    }

    #[test]
    fn test_open_eyes_without_prior_blink_asks_for_blink() {
        let gate = TickGate::new();
        let mut r = recognizer();
        let outcome = r.apply(gate.dispatch(), &[detection(&[0.0, 0.0], OPEN)]).unwrap();
        assert_eq!(
            outcome.status(),
            Some(PanelContent::text("Please blink to confirm liveness."))
        );
        assert!(outcome.overlay().is_none());
        assert_eq!(
            r.liveness(),
            &LivenessState::PendingBlink { label: "Elon".into(), confirmed: None }
        );
    }

    #[test]
    fn test_unknown_face_confirmed_is_not_recognized() {
        let gate = TickGate::new();
        let mut r = recognizer();
        let outcome = r.apply(gate.dispatch(), &[detection(&[9.0, 9.0], BLINK)]).unwrap();
        assert_eq!(outcome.status(), Some(PanelContent::text("Face not recognized.")));
        assert_eq!(outcome.detail_label(), None);
        let (_, caption) = outcome.overlay().unwrap();
        assert!(caption.starts_with("unknown ("));
    }

    #[test]
    fn test_only_first_detection_counts() {
        let gate = TickGate::new();
        let mut r = recognizer();
        let outcome = r
            .apply(
                gate.dispatch(),
                &[detection(&[1.0, 1.0], BLINK), detection(&[0.0, 0.0], BLINK)],
            )
            .unwrap();
        assert_eq!(outcome.detail_label(), Some("Saqib"));
    }

    #[test]
    fn test_overlay_box_offset() {
        let gate = TickGate::new();
        let mut r = recognizer();
        let outcome = r.apply(gate.dispatch(), &[detection(&[0.0, 0.0], BLINK)]).unwrap();
        let (bbox, caption) = outcome.overlay().unwrap();
        assert_eq!(bbox, BoundingBox { x: 175.0, y: 120.0, width: 100.0, height: 110.0 });
        assert_eq!(caption, "Elon (0.00)");
    }

    #[test]
    fn test_stale_tick_discarded() {
        let gate = TickGate::new();
        let mut r = recognizer();
        let slow = gate.dispatch();
        let fast = gate.dispatch();
        assert_eq!(gate.latest_dispatched(), 2);

        assert!(r.apply(fast, &[detection(&[0.0, 0.0], OPEN)]).is_some());
        assert!(r.is_current(fast));
        let state = r.liveness().clone();

        assert!(r.apply(slow, &[detection(&[1.0, 1.0], BLINK)]).is_none());
        assert_eq!(r.liveness(), &state);
        assert!(r.is_current(fast));
        assert!(!r.is_current(slow));
    }

    #[test]
    fn test_ticket_sequence_is_monotonic() {
        let gate = TickGate::new();
        let a = gate.dispatch();
        let b = gate.dispatch();
        assert!(b > a);
        assert_eq!(a.sequence() + 1, b.sequence());
    }
}
