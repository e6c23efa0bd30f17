use serde::{Deserialize, Serialize};

/// Index range of the left-eye points in the 68-point landmark scheme.
const LEFT_EYE: std::ops::Range<usize> = 36..42;
/// Index range of the right-eye points in the 68-point landmark scheme.
const RIGHT_EYE: std::ops::Range<usize> = 42..48;

/// A 2D landmark coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Bounding box for a detected face, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Return a copy shifted by `(dx, dy)`; width and height are preserved.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Facial landmarks in the 68-point scheme.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    pub points: Vec<Point>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Six-point left-eye sequence, or `None` if the landmark set is truncated.
    pub fn left_eye(&self) -> Option<&[Point]> {
        self.points.get(LEFT_EYE)
    }

    /// Six-point right-eye sequence, or `None` if the landmark set is truncated.
    pub fn right_eye(&self) -> Option<&[Point]> {
        self.points.get(RIGHT_EYE)
    }
}

/// Face descriptor vector (128-dimensional for the usual recognition nets).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Compute Euclidean distance between two embeddings.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// One detected face in a frame: box, landmarks and descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub score: Option<f32>,
    pub landmarks: FaceLandmarks,
    pub descriptor: Embedding,
}

impl Detection {
    /// Rescale box and landmarks by independent horizontal and vertical factors.
    pub fn rescaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            bbox: BoundingBox {
                x: self.bbox.x * sx,
                y: self.bbox.y * sy,
                width: self.bbox.width * sx,
                height: self.bbox.height * sy,
            },
            score: self.score,
            landmarks: FaceLandmarks::new(
                self.landmarks
                    .points
                    .iter()
                    .map(|p| Point::new(p.x * sx, p.y * sy))
                    .collect(),
            ),
            descriptor: self.descriptor.clone(),
        }
    }

    /// Drop the box, keeping what enrollment needs.
    pub fn into_sample(self) -> FaceSample {
        FaceSample {
            landmarks: self.landmarks,
            descriptor: self.descriptor,
        }
    }
}

/// Result of single-face detection on a reference image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSample {
    pub landmarks: FaceLandmarks,
    pub descriptor: Embedding,
}

/// Rescale every detection from `from` (frame size) to `to` (display size).
///
/// Zero-sized inputs leave the detections untouched.
pub fn resize_detections(
    detections: Vec<Detection>,
    from: (u32, u32),
    to: (u32, u32),
) -> Vec<Detection> {
    if from == to || from.0 == 0 || from.1 == 0 {
        return detections;
    }
    let sx = to.0 as f32 / from.0 as f32;
    let sy = to.1 as f32 / from.1 as f32;
    detections.iter().map(|d| d.rescaled(sx, sy)).collect()
}
