//! Nearest-neighbour matching of a probe descriptor against enrolled sets.

use crate::types::Embedding;
use std::fmt;

/// Label reported when no enrolled set is close enough.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Default maximum Euclidean distance for a positive match.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.6;

/// All reference descriptors collected for one identity label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledEmbeddings {
    pub label: String,
    pub embeddings: Vec<Embedding>,
}

impl LabeledEmbeddings {
    pub fn new(label: impl Into<String>, embeddings: Vec<Embedding>) -> Self {
        Self {
            label: label.into(),
            embeddings,
        }
    }

    /// Mean distance from `probe` to every descriptor in the set.
    ///
    /// `None` for an empty set, which therefore never wins a match.
    pub fn mean_distance(&self, probe: &Embedding) -> Option<f32> {
        if self.embeddings.is_empty() {
            return None;
        }
        let total: f32 = self
            .embeddings
            .iter()
            .map(|e| e.euclidean_distance(probe))
            .sum();
        Some(total / self.embeddings.len() as f32)
    }
}

/// Closest label for a probe descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub label: String,
    pub distance: f32,
}

impl BestMatch {
    /// Case-insensitive check for the `unknown` outcome.
    pub fn is_unknown(&self) -> bool {
        self.label.eq_ignore_ascii_case(UNKNOWN_LABEL)
    }
}

impl fmt::Display for BestMatch {
    /// `label (d.dd)`, with the distance rounded down to two decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distance = (self.distance * 100.0).floor() / 100.0;
        write!(f, "{} ({:.2})", self.label, distance)
    }
}

/// Immutable matcher over the enrolled sets, built once after enrollment.
#[derive(Debug, Clone)]
pub struct FaceMatcher {
    sets: Vec<LabeledEmbeddings>,
    distance_threshold: f32,
}

impl FaceMatcher {
    pub fn new(sets: Vec<LabeledEmbeddings>, distance_threshold: f32) -> Self {
        Self {
            sets,
            distance_threshold,
        }
    }

    pub fn sets(&self) -> &[LabeledEmbeddings] {
        &self.sets
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    /// Find the enrolled label with the smallest mean distance to `probe`.
    ///
    /// Returns [`UNKNOWN_LABEL`] unless that distance is strictly below the
    /// threshold. With nothing enrolled the distance is `f32::INFINITY`.
    pub fn best_match(&self, probe: &Embedding) -> BestMatch {
        let mut best: Option<(&str, f32)> = None;

        for set in &self.sets {
            let Some(distance) = set.mean_distance(probe) else {
                continue;
            };
            let is_better = match best {
                None => true,
                Some((_, d)) => distance < d,
            };
            if is_better {
                best = Some((set.label.as_str(), distance));
            }
        }

        match best {
            Some((label, distance)) if distance < self.distance_threshold => BestMatch {
                label: label.to_string(),
                distance,
            },
            Some((_, distance)) => BestMatch {
                label: UNKNOWN_LABEL.to_string(),
                distance,
            },
            None => BestMatch {
                label: UNKNOWN_LABEL.to_string(),
                distance: f32::INFINITY,
            },
        }
    }
}
