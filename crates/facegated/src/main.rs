use anyhow::Result;
use facegate_capture::{AnnotationAnalyzer, ImageSequence};
use facegate_core::{DetailStore, FaceMatcher};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod pipeline;
mod render;

use config::Config;
use pipeline::Pipeline;
use render::{CanvasOverlay, TerminalPanel};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    tracing::info!(
        labels_dir = %config.labels_dir.display(),
        capture_dir = %config.capture_dir.display(),
        labels = ?config.labels,
        tick_ms = config.tick_interval.as_millis() as u64,
        "facegated starting"
    );

    // A capture source that cannot be opened is logged and the loop never starts.
    let source = match ImageSequence::open(&config.capture_dir, config.capture_loop) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "capture source unavailable; recognition not started");
            return Ok(());
        }
    };

    let engine = engine::spawn_engine(source, AnnotationAnalyzer::new())?;

    let sets = engine
        .enroll(
            config.labels_dir.clone(),
            config.labels.clone(),
            config.images_per_label,
        )
        .await?;
    let enrolled = sets.iter().filter(|s| !s.embeddings.is_empty()).count();
    tracing::info!(enrolled, total = sets.len(), "enrollment complete");

    let pipeline = Arc::new(Pipeline::new(
        engine,
        FaceMatcher::new(sets, config.distance_threshold),
        config.recognizer_settings(),
        DetailStore::new(config.labels_dir.clone()),
        TerminalPanel::new(),
        CanvasOverlay::new(config.overlay_path.clone()),
        config.display_size,
    ));

    tokio::select! {
        ticks = pipeline.run(config.tick_interval) => {
            tracing::info!(ticks, "recognition loop finished");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("facegated shutting down");
        }
    }

    Ok(())
}
