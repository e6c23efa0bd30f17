//! Frame type and decoding from still images.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A captured RGB frame.
#[derive(Clone)]
pub struct Frame {
    /// Packed RGB8 pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// When the frame was captured.
    pub timestamp: Instant,
    pub sequence: u32,
    /// File the frame was decoded from, when it came from disk.
    pub source: Option<PathBuf>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Wrap raw RGB8 pixels, checking the buffer length.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32, sequence: u32) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
            source: None,
        })
    }

    /// Decode an image file (any format the `image` crate reads) into a frame.
    pub fn open(path: &Path, sequence: u32) -> Result<Self, FrameError> {
        let img = image::open(path)
            .map_err(|source| FrameError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let (width, height) = img.dimensions();
        let mut frame = Self::from_rgb(img.into_raw(), width, height, sequence)?;
        frame.source = Some(path.to_path_buf());
        Ok(frame)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Time elapsed since capture.
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }

    /// Average luma (0.0–255.0), using integer BT.601 weights.
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self
            .data
            .chunks_exact(3)
            .map(|px| (px[0] as u64 * 299 + px[1] as u64 * 587 + px[2] as u64 * 114) / 1000)
            .sum();
        sum as f32 / (self.data.len() / 3) as f32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid RGB length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_checks_length() {
        assert!(Frame::from_rgb(vec![0; 12], 2, 2, 0).is_ok());
        let err = Frame::from_rgb(vec![0; 11], 2, 2, 0).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { expected: 12, actual: 11 }));
    }

    #[test]
    fn test_age_grows_from_capture() {
        let mut frame = Frame::from_rgb(vec![0; 3], 1, 1, 0).unwrap();
        assert!(frame.age() < Duration::from_secs(5));
        frame.timestamp = Instant::now() - Duration::from_millis(250);
        assert!(frame.age() >= Duration::from_millis(250));
    }

    #[test]
    fn test_avg_brightness() {
        let frame = Frame::from_rgb(vec![255, 255, 255, 0, 0, 0], 2, 1, 0).unwrap();
        assert!((frame.avg_brightness() - 127.5).abs() < 1e-3);
    }

    #[test]
    fn test_open_png_round_trip() {
        let dir = std::env::temp_dir().join(format!("facegate-frame-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("f.png");
        image::RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let frame = Frame::open(&path, 7).unwrap();
        assert_eq!(frame.dimensions(), (4, 3));
        assert_eq!(frame.sequence, 7);
        assert_eq!(&frame.data[..3], &[10, 20, 30]);
        assert_eq!(frame.source.as_deref(), Some(path.as_path()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_open_missing_file() {
        let err = Frame::open(Path::new("/nonexistent/facegate.png"), 0).unwrap_err();
        assert!(matches!(err, FrameError::Decode { .. }));
    }
}
