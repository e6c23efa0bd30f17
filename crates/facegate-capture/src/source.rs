//! Frame sources. The live loop only needs "give me the current frame".

use crate::frame::{Frame, FrameError};
use std::path::{Path, PathBuf};
use thiserror::Error;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture source not found: {0}")]
    SourceNotFound(String),
    #[error("capture source has no frames: {0}")]
    NoFrames(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Anything that yields frames in capture order.
pub trait FrameSource: Send {
    /// Next frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}

/// Replays a directory of still images in file-name order.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    position: usize,
    looping: bool,
    sequence: u32,
}

impl ImageSequence {
    /// Scan `dir` for image files. Fails if the directory is missing or empty.
    pub fn open(dir: &Path, looping: bool) -> Result<Self, CaptureError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::SourceNotFound(format!("{}: {e}", dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CaptureError::NoFrames(dir.display().to_string()));
        }

        tracing::info!(dir = %dir.display(), frames = paths.len(), looping, "image sequence opened");

        Ok(Self {
            paths,
            position: 0,
            looping,
            sequence: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.position >= self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            self.position = 0;
        }
        let path = &self.paths[self.position];
        self.position += 1;
        self.sequence = self.sequence.wrapping_add(1);
        let frame = Frame::open(path, self.sequence)?;
        tracing::trace!(path = %path.display(), sequence = self.sequence, "frame captured");
        Ok(Some(frame))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
