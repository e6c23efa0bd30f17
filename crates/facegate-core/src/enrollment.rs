//! Builds one descriptor set per identity label from its reference images.

use crate::analyzer::FaceAnalyzer;
use crate::matcher::LabeledEmbeddings;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Reference images are numbered from 1.
pub fn reference_image_path(labels_dir: &Path, label: &str, index: usize) -> PathBuf {
    labels_dir.join(label).join(format!("{index}.png"))
}

/// Enroll every label with up to `images_per_label` reference images.
///
/// `load` produces the image for `(label, index)`. Images that fail to load,
/// fail inference, or contain no face are skipped; a label whose images all
/// fail ends up with an empty set. Never fails as a whole.
pub fn enroll<A, L, E>(
    analyzer: &mut A,
    labels: &[String],
    images_per_label: usize,
    mut load: L,
) -> Vec<LabeledEmbeddings>
where
    A: FaceAnalyzer,
    L: FnMut(&str, usize) -> Result<A::Image, E>,
    E: Display,
{
    labels
        .iter()
        .map(|label| {
            let mut embeddings = Vec::with_capacity(images_per_label);
            for index in 1..=images_per_label {
                let image = match load(label, index) {
                    Ok(image) => image,
                    Err(e) => {
                        tracing::debug!(label = %label, index, error = %e, "enroll: image unavailable");
                        continue;
                    }
                };
                match analyzer.detect_single(&image) {
                    Ok(Some(sample)) => embeddings.push(sample.descriptor),
                    Ok(None) => {
                        tracing::debug!(label = %label, index, "enroll: no face in reference image");
                    }
                    Err(e) => {
                        tracing::warn!(label = %label, index, error = %e, "enroll: inference failed");
                    }
                }
            }
            tracing::info!(label = %label, usable = embeddings.len(), "enrolled label");
            LabeledEmbeddings::new(label.clone(), embeddings)
        })
        .collect()
}
