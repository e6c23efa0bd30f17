use facegate_core::liveness::DEFAULT_BLINK_THRESHOLD;
use facegate_core::matcher::DEFAULT_DISTANCE_THRESHOLD;
use facegate_core::recognition::{DEFAULT_BOX_OFFSET_X, DEFAULT_BOX_OFFSET_Y};
use facegate_core::RecognizerSettings;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LABELS: &str = "Pragalbh,Elon,Saqib";

/// Daemon configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the per-label directories (reference images and details.json).
    pub labels_dir: PathBuf,
    /// Identity labels to enroll.
    pub labels: Vec<String>,
    /// Reference images per label, numbered from 1.
    pub images_per_label: usize,
    /// Directory of frames replayed as the live stream.
    pub capture_dir: PathBuf,
    /// Restart the frame sequence when it runs out.
    pub capture_loop: bool,
    /// Recognition tick period.
    pub tick_interval: Duration,
    /// Maximum mean Euclidean distance for a positive match.
    pub distance_threshold: f32,
    /// Left-eye openness below which a blink is registered.
    pub blink_threshold: f32,
    pub box_offset_x: f32,
    pub box_offset_y: f32,
    /// Display size detections are rescaled to; frame size when unset.
    pub display_size: Option<(u32, u32)>,
    /// Where to write the overlay canvas after each tick.
    pub overlay_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `FACEGATE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let labels_dir = std::env::var("FACEGATE_LABELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("labels"));

        let labels = parse_labels(
            &std::env::var("FACEGATE_LABELS").unwrap_or_else(|_| DEFAULT_LABELS.to_string()),
        );

        let display_size = match (
            env_opt::<u32>("FACEGATE_DISPLAY_WIDTH"),
            env_opt::<u32>("FACEGATE_DISPLAY_HEIGHT"),
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        };

        Self {
            labels_dir,
            labels,
            images_per_label: env_or("FACEGATE_IMAGES_PER_LABEL", 2),
            capture_dir: std::env::var("FACEGATE_CAPTURE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("capture")),
            capture_loop: std::env::var("FACEGATE_CAPTURE_LOOP")
                .map(|v| v != "0")
                .unwrap_or(false),
            tick_interval: Duration::from_millis(env_or("FACEGATE_TICK_MS", 100u64).max(1)),
            distance_threshold: env_or("FACEGATE_DISTANCE_THRESHOLD", DEFAULT_DISTANCE_THRESHOLD),
            blink_threshold: env_or("FACEGATE_BLINK_THRESHOLD", DEFAULT_BLINK_THRESHOLD),
            box_offset_x: env_or("FACEGATE_BOX_OFFSET_X", DEFAULT_BOX_OFFSET_X),
            box_offset_y: env_or("FACEGATE_BOX_OFFSET_Y", DEFAULT_BOX_OFFSET_Y),
            display_size,
            overlay_path: std::env::var("FACEGATE_OVERLAY_PATH").ok().map(PathBuf::from),
        }
    }

    pub fn recognizer_settings(&self) -> RecognizerSettings {
        RecognizerSettings {
            blink_threshold: self.blink_threshold,
            box_offset: (self.box_offset_x, self.box_offset_y),
        }
    }
}

/// Split a comma-separated label list, dropping blanks and duplicates.
fn parse_labels(raw: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}

fn env_opt<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key).unwrap_or(default)
}
