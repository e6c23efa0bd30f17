use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_capture::{AnnotationAnalyzer, Frame};
use facegate_core::enrollment::{enroll, reference_image_path};
use facegate_core::liveness::DEFAULT_BLINK_THRESHOLD;
use facegate_core::{DetailStore, EyeOpenness, FaceAnalyzer, VehicleRegistry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facegate", about = "facegate recognition and lookup tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a registered vehicle by plate number
    Vehicle {
        /// Plate number (case and surrounding whitespace are ignored)
        plate: String,
        /// Alternative vehicle table (TOML, same shape as contrib/vehicles.toml)
        #[arg(long)]
        registry: Option<PathBuf>,
    },
    /// Show the detail record for an enrolled label
    Details {
        label: String,
        #[arg(long, default_value = "labels")]
        labels_dir: PathBuf,
    },
    /// Enroll labels from their reference images and report usable images
    Enroll {
        #[arg(long, default_value = "labels")]
        labels_dir: PathBuf,
        /// Label to enroll (repeatable)
        #[arg(short, long = "label", default_values_t = ["Pragalbh".to_string(), "Elon".to_string(), "Saqib".to_string()])]
        labels: Vec<String>,
        /// Reference images per label
        #[arg(long, default_value_t = 2)]
        images: usize,
    },
    /// Print the detections and eye openness for one annotated frame
    Inspect {
        image: PathBuf,
        #[arg(long, default_value_t = DEFAULT_BLINK_THRESHOLD)]
        blink_threshold: f32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Vehicle { plate, registry } => {
            let content = match registry {
                Some(path) => {
                    let src = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    VehicleRegistry::from_toml_str(&src)?.render(&plate)
                }
                None => VehicleRegistry::builtin().render(&plate),
            };
            println!("{content}");
        }
        Commands::Details { label, labels_dir } => {
            let content = DetailStore::new(labels_dir).render(&label).await;
            println!("{content}");
        }
        Commands::Enroll {
            labels_dir,
            labels,
            images,
        } => {
            let mut analyzer = AnnotationAnalyzer::new();
            let sets = enroll(&mut analyzer, &labels, images, |label, i| {
                Frame::open(&reference_image_path(&labels_dir, label, i), i as u32)
            });
            for set in &sets {
                let note = if set.embeddings.is_empty() {
                    " (cannot be matched)"
                } else {
                    ""
                };
                println!("{}: {}/{images} usable{note}", set.label, set.embeddings.len());
            }
        }
        Commands::Inspect {
            image,
            blink_threshold,
        } => {
            let frame = Frame::open(&image, 0)?;
            let detections = AnnotationAnalyzer::new().detect_all(&frame)?;
            let faces: Vec<_> = detections
                .iter()
                .map(|d| {
                    let eyes = EyeOpenness::measure(&d.landmarks);
                    serde_json::json!({
                        "box": d.bbox,
                        "score": d.score,
                        "left_eye_openness": eyes.left,
                        "right_eye_openness": eyes.right,
                        "blinking": eyes.is_blinking(blink_threshold),
                        "descriptor_len": d.descriptor.values.len(),
                    })
                })
                .collect();
            let report = serde_json::json!({
                "image": image.display().to_string(),
                "width": frame.width,
                "height": frame.height,
                "brightness": frame.avg_brightness(),
                "faces": faces,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
