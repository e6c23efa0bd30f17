//! Periodic recognition loop.
//!
//! Every tick is dispatched on its own task, whether or not earlier ticks
//! have finished. Each tick's ticket comes from the engine when its frame is
//! captured, so results are applied in frame order; a tick whose frame is
//! older than one already applied is dropped.

use crate::engine::{EngineError, EngineHandle};
use crate::render::{Overlay, Panel};
use facegate_core::types::resize_detections;
use facegate_core::{DetailStore, FaceMatcher, Recognizer, RecognizerSettings};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// How a single tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Result applied to the liveness state and rendered.
    Applied,
    /// A newer tick was applied first; nothing rendered.
    Stale,
    /// The capture source has no more frames.
    StreamEnded,
    /// Capture or inference failed for this tick.
    Failed,
}

pub struct Pipeline<P, O> {
    engine: EngineHandle,
    recognizer: Mutex<Recognizer>,
    details: DetailStore,
    panel: P,
    overlay: O,
    display_size: Option<(u32, u32)>,
}

impl<P, O> Pipeline<P, O>
where
    P: Panel + 'static,
    O: Overlay + 'static,
{
    pub fn new(
        engine: EngineHandle,
        matcher: FaceMatcher,
        settings: RecognizerSettings,
        details: DetailStore,
        panel: P,
        overlay: O,
        display_size: Option<(u32, u32)>,
    ) -> Self {
        Self {
            engine,
            recognizer: Mutex::new(Recognizer::new(matcher, settings)),
            details,
            panel,
            overlay,
            display_size,
        }
    }

    fn recognizer(&self) -> MutexGuard<'_, Recognizer> {
        self.recognizer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn panel(&self) -> &P {
        &self.panel
    }

    #[cfg(test)]
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Dispatch a tick every `interval` until the capture stream ends.
    ///
    /// Returns the number of ticks dispatched. Ticks still in flight when
    /// the stream ends are aborted.
    pub async fn run(self: Arc<Self>, interval: Duration) -> u64 {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tasks: JoinSet<TickStatus> = JoinSet::new();
        let mut dispatched = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    dispatched += 1;
                    let this = Arc::clone(&self);
                    tasks.spawn(async move { this.tick().await });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Ok(TickStatus::StreamEnded) = joined {
                        tracing::info!("capture stream ended; stopping recognition loop");
                        break;
                    }
                }
            }
        }

        tasks.abort_all();
        dispatched
    }

    /// Run one recognition tick end to end.
    pub async fn tick(&self) -> TickStatus {
        let frame = match self.engine.detect().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return TickStatus::StreamEnded,
            Err(EngineError::ChannelClosed) => return TickStatus::StreamEnded,
            Err(e) => {
                tracing::warn!(error = %e, "detection failed");
                return TickStatus::Failed;
            }
        };

        let ticket = frame.ticket;
        tracing::trace!(
            tick = ticket.sequence(),
            frame = frame.sequence,
            faces = frame.detections.len(),
            "tick detections"
        );
        let display = self.display_size.unwrap_or(frame.size);
        let detections = resize_detections(frame.detections, frame.size, display);

        let applied = self.recognizer().apply(ticket, &detections);
        let Some(outcome) = applied else {
            return TickStatus::Stale;
        };

        self.overlay.resize(display.0, display.1);
        self.overlay.clear();

        if let Some(status) = outcome.status() {
            self.panel.show(&status);
        } else if let Some(label) = outcome.detail_label() {
            let content = self.details.render(label).await;
            let current = self.recognizer().is_current(ticket);
            if !current {
                tracing::debug!(tick = ticket.sequence(), label, "details superseded by newer tick");
                return TickStatus::Stale;
            }
            self.panel.show(&content);
        }

        if let Some((bbox, caption)) = outcome.overlay() {
            self.overlay.draw_box(bbox, &caption);
        }
        self.overlay.present();

        TickStatus::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn_engine;
    use crate::render::CanvasOverlay;
    use facegate_capture::{CaptureError, Frame, FrameSource};
    use facegate_core::{
        AnalyzerError, BoundingBox, Detection, Embedding, FaceAnalyzer, FaceLandmarks, FaceSample,
        LabeledEmbeddings, LivenessState, PanelContent, Point,
    };
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingPanel {
        shown: Mutex<Vec<PanelContent>>,
    }

    impl RecordingPanel {
        fn history(&self) -> Vec<String> {
            self.shown.lock().unwrap().iter().map(|c| c.to_string()).collect()
        }
    }

    impl Panel for RecordingPanel {
        fn show(&self, content: &PanelContent) {
            self.shown.lock().unwrap().push(content.clone());
        }
    }

    struct CountedFrames {
        next: u32,
        total: u32,
    }

    impl FrameSource for CountedFrames {
        fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
            if self.next >= self.total {
                return Ok(None);
            }
            self.next += 1;
            Ok(Some(Frame::from_rgb(vec![0; 640 * 480 * 3], 640, 480, self.next)?))
        }
    }

    /// Per-frame script: `None` = no face, `Some((descriptor, eye half-height))`.
    struct Script(Vec<Option<([f32; 2], f32)>>);

    impl FaceAnalyzer for Script {
        type Image = Frame;

        fn detect_all(&mut self, image: &Frame) -> Result<Vec<Detection>, AnalyzerError> {
            let entry = self.0.get(image.sequence as usize - 1).copied().flatten();
            Ok(entry.map(|(d, h)| vec![face(d, h)]).unwrap_or_default())
        }

        fn detect_single(&mut self, _image: &Frame) -> Result<Option<FaceSample>, AnalyzerError> {
            Ok(None)
        }
    }

    fn face(descriptor: [f32; 2], half_height: f32) -> Detection {
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
            bbox: BoundingBox { x: 300.0, y: 100.0, width: 120.0, height: 140.0 },
            score: Some(0.99),
            landmarks: FaceLandmarks::new(points),
            descriptor: Embedding::new(descriptor.to_vec()),
        }
    }

    fn labels_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("facegate-pipeline-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("Elon")).unwrap();
        std::fs::write(
            dir.join("Elon/details.json"),
            r#"{"name": "Elon", "course": "MCA", "status": "Active", "college": "IET",
                "rollnumber": "42", "examform": "Filled"}"#,
        )
        .unwrap();
        dir
    }

    fn pipeline(script: Script, dir: &PathBuf) -> Arc<Pipeline<RecordingPanel, CanvasOverlay>> {
        let total = script.0.len() as u32;
        let engine = spawn_engine(CountedFrames { next: 0, total }, script).unwrap();
        let matcher = FaceMatcher::new(
            vec![
                LabeledEmbeddings::new("Elon", vec![Embedding::new(vec![0.0, 0.0])]),
                LabeledEmbeddings::new("Saqib", vec![]),
            ],
            0.6,
        );
        Arc::new(Pipeline::new(
            engine,
            matcher,
            RecognizerSettings::default(),
            DetailStore::new(dir),
            RecordingPanel::default(),
            CanvasOverlay::new(None),
            None,
        ))
    }

    const BLINK: f32 = 2.0;
    const OPEN: f32 = 6.0;

    #[tokio::test]
    async fn test_tick_sequence_renders_expected_panels() {
        let dir = labels_dir("sequence");
        let p = pipeline(
            Script(vec![
                Some(([0.0, 0.0], OPEN)),
                Some(([0.0, 0.0], BLINK)),
                Some(([0.1, 0.0], OPEN)),
                None,
                Some(([5.0, 5.0], BLINK)),
            ]),
            &dir,
        );
        for _ in 0..5 {
            assert_eq!(p.tick().await, TickStatus::Applied);
        }
        assert_eq!(p.tick().await, TickStatus::StreamEnded);

        let history = p.panel().history();
        let elon = "Name: Elon\nCourse: MCA\nStatus: Active\nCollege: IET\nRoll Number: 42\nExam Form: Filled";
        assert_eq!(
            history,
            vec![
                "Please blink to confirm liveness.".to_string(),
                elon.to_string(),
                elon.to_string(),
                "No face detected.".to_string(),
                "Face not recognized.".to_string(),
            ]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_no_face_keeps_liveness_and_clears_overlay() {
        let dir = labels_dir("noface");
        let p = pipeline(Script(vec![Some(([0.0, 0.0], BLINK)), None]), &dir);
        p.tick().await;
        let boxes = p.overlay().boxes();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].0.x, 175.0);
        assert_eq!(boxes[0].1, "Elon (0.00)");

        p.tick().await;
        assert!(p.overlay().boxes().is_empty());
        assert_eq!(p.recognizer().liveness(), &LivenessState::Confirmed("Elon".into()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_concurrent_ticks_settle_on_newest_frame() {
        let dir = labels_dir("concurrent");
        let p = pipeline(Script(vec![Some(([0.0, 0.0], OPEN)), Some(([0.0, 0.0], BLINK))]), &dir);

        let (a, b) = tokio::join!(p.tick(), p.tick());
        let statuses = [a, b];
        assert!(statuses.contains(&TickStatus::Applied));

        // Whichever task finishes last, the blink frame is the one that sticks.
        let history = p.panel().history();
        assert!(history.last().unwrap().starts_with("Name: Elon"));
        assert_eq!(p.recognizer().liveness(), &LivenessState::Confirmed("Elon".into()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_details_render_message() {
        let dir = labels_dir("missing");
        std::fs::remove_file(dir.join("Elon/details.json")).unwrap();
        let p = pipeline(Script(vec![Some(([0.0, 0.0], BLINK))]), &dir);
        p.tick().await;
        assert_eq!(p.panel().history(), vec!["No details found for Elon".to_string()]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_run_stops_when_stream_ends() {
        let dir = labels_dir("run");
        let p = pipeline(Script(vec![None, None, None]), &dir);
        let dispatched = Arc::clone(&p).run(Duration::from_millis(5)).await;
        assert!(dispatched >= 4);
        assert!(p
            .panel()
            .history()
            .iter()
            .all(|s| s == "No face detected."));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
