use facegate_capture::{CaptureError, Frame, FrameSource};
use facegate_core::enrollment::{self, reference_image_path};
use facegate_core::{AnalyzerError, Detection, FaceAnalyzer, LabeledEmbeddings, TickGate, TickTicket};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Detections for one captured frame.
#[derive(Debug, Clone)]
pub struct FrameDetections {
    /// Issued when the frame is captured, so ticket order is frame order.
    pub ticket: TickTicket,
    pub sequence: u32,
    /// Frame size the detections are expressed in.
    pub size: (u32, u32),
    pub detections: Vec<Detection>,
}

/// Messages sent from async tasks to the engine thread.
enum EngineRequest {
    Enroll {
        labels_dir: PathBuf,
        labels: Vec<String>,
        images_per_label: usize,
        reply: oneshot::Sender<Vec<LabeledEmbeddings>>,
    },
    Detect {
        reply: oneshot::Sender<Result<Option<FrameDetections>, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Build one descriptor set per label from `<labels_dir>/<label>/<i>.png`.
    pub async fn enroll(
        &self,
        labels_dir: PathBuf,
        labels: Vec<String>,
        images_per_label: usize,
    ) -> Result<Vec<LabeledEmbeddings>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Enroll {
                labels_dir,
                labels,
                images_per_label,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Capture the current frame and detect every face in it.
    ///
    /// `Ok(None)` once the capture stream has ended.
    pub async fn detect(&self) -> Result<Option<FrameDetections>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Detect { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the capture source and the analyzer; requests are served
/// one at a time in arrival order. Each captured frame gets the next tick
/// ticket from the engine's [`TickGate`].
pub fn spawn_engine<S, A>(mut source: S, mut analyzer: A) -> Result<EngineHandle, EngineError>
where
    S: FrameSource + 'static,
    A: FaceAnalyzer<Image = Frame> + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("facegate-engine".into())
        .spawn(move || {
            let gate = TickGate::new();
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Enroll {
                        labels_dir,
                        labels,
                        images_per_label,
                        reply,
                    } => {
                        let sets = enrollment::enroll(&mut analyzer, &labels, images_per_label, |label, i| {
                            Frame::open(&reference_image_path(&labels_dir, label, i), i as u32)
                        });
                        let _ = reply.send(sets);
                    }
                    EngineRequest::Detect { reply } => {
                        let _ = reply.send(run_detect(&mut source, &mut analyzer, &gate));
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn run_detect<S, A>(
    source: &mut S,
    analyzer: &mut A,
    gate: &TickGate,
) -> Result<Option<FrameDetections>, EngineError>
where
    S: FrameSource,
    A: FaceAnalyzer<Image = Frame>,
{
    let Some(frame) = source.next_frame()? else {
        return Ok(None);
    };
    let ticket = gate.dispatch();
    let detections = analyzer.detect_all(&frame)?;
    tracing::trace!(
        tick = ticket.sequence(),
        sequence = frame.sequence,
        faces = detections.len(),
        latency_ms = frame.age().as_millis() as u64,
        "frame analysed"
    );
    Ok(Some(FrameDetections {
        ticket,
        sequence: frame.sequence,
        size: frame.dimensions(),
        detections,
    }))
}
