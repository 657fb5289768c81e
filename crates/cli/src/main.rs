use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;

use facecam_core::pipeline::frame_processor::{
    DetectionResult, ProcessingOptions, ProcessorConfig,
};
use facecam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facecam_core::pipeline::processor_factory::{create_processor, EngineSettings};
use facecam_core::pipeline::viewer_session::{TickOutcome, ViewerSession};
use facecam_core::shared::constants::{
    DEFAULT_CAMERA_INDEX, DEFAULT_DETECTION_SCALE, DEFAULT_DISPLAY_SCALE,
    DEFAULT_TICK_INTERVAL_MS,
};
use facecam_core::shared::frame::Frame;
use facecam_core::video::domain::frame_source::FrameSource;
use facecam_core::video::domain::image_writer::ImageWriter;
use facecam_core::video::infrastructure::camera_source::CameraSource;
use facecam_core::video::infrastructure::image_file_source::ImageFileSource;
use facecam_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Face, landmark and identity overlays for a webcam or a still image.
#[derive(Parser)]
#[command(name = "facecam")]
struct Cli {
    /// Annotate this image once instead of reading the camera.
    #[arg(long, conflicts_with = "camera")]
    image: Option<PathBuf>,

    /// Save the last annotated frame here.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Camera device index.
    #[arg(long, default_value_t = DEFAULT_CAMERA_INDEX)]
    camera: u32,

    /// Number of camera ticks to run.
    #[arg(long, default_value = "100")]
    ticks: usize,

    /// Delay between camera ticks in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TICK_INTERVAL_MS)]
    interval_ms: u64,

    /// Directory of reference photos; file stems become identity labels.
    #[arg(long)]
    gallery: Option<PathBuf>,

    /// Directory searched for pre-installed ONNX models.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Skip face detection (and everything that depends on it).
    #[arg(long)]
    no_faces: bool,

    /// Extract and draw facial landmarks (5-point unless the 68-point model
    /// is installed).
    #[arg(long)]
    landmarks: bool,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Capture-to-display downscale (0.0-1.0].
    #[arg(long, default_value_t = DEFAULT_DISPLAY_SCALE)]
    display_scale: f64,

    /// Display-to-detection downscale on both axes (0.0-1.0].
    #[arg(long, default_value_t = DEFAULT_DETECTION_SCALE)]
    detection_scale: f64,

    /// Cosine similarity needed to accept an identity match (-1.0-1.0).
    #[arg(long, default_value = "0.4")]
    match_threshold: f64,

    /// TrueType font for identity labels (defaults to a system font).
    #[arg(long)]
    label_font: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = ProcessorConfig {
        display_scale: cli.display_scale,
        detection_scale: (cli.detection_scale, cli.detection_scale),
        match_threshold: cli.match_threshold,
    };
    let settings = EngineSettings {
        confidence: cli.confidence,
        landmarks: cli.landmarks,
        gallery_dir: cli.gallery.clone(),
        models_dir: cli.models_dir.clone(),
        label_font: cli.label_font.clone(),
    };
    let processor = create_processor(&config, &settings, Some(download_progress))?
        .with_logger(Box::new(StdoutPipelineLogger::new(10)));

    let (source, ticks) = match cli.image {
        Some(ref path) => {
            let still: Box<dyn FrameSource> = Box::new(ImageFileSource::open(path)?);
            (still, 1)
        }
        None => {
            let camera: Box<dyn FrameSource> = Box::new(CameraSource::open(cli.camera)?);
            (camera, cli.ticks)
        }
    };
    let options = ProcessingOptions {
        detect_faces: !cli.no_faces,
        detect_landmarks: cli.landmarks,
        recognize_identities: true,
    };

    let mut session = ViewerSession::new(source, processor);
    let last = run_ticks(&mut session, options, ticks, Duration::from_millis(cli.interval_ms));
    session.stop();
    session.processor().logger().summary();

    if let Some(ref output) = cli.output {
        let frame = last.ok_or("No frame was captured; nothing to save")?;
        ImageFileWriter::new().write(output, &frame)?;
        log::info!("Output written to {}", output.display());
    }

    Ok(())
}

/// Drives the session for `ticks` ticks and returns the last rendered frame.
fn run_ticks(
    session: &mut ViewerSession,
    options: ProcessingOptions,
    ticks: usize,
    interval: Duration,
) -> Option<Frame> {
    let mut last = None;
    for i in 0..ticks {
        if i > 0 && !interval.is_zero() {
            thread::sleep(interval);
        }
        match session.tick(options) {
            TickOutcome::Rendered {
                frame,
                result,
                metrics,
            } => {
                log::debug!("{} | {}", metrics.fps_label(), describe(&result));
                last = Some(frame);
            }
            TickOutcome::NoFrame => {}
            TickOutcome::Stopped => break,
        }
    }
    last
}

fn describe(result: &DetectionResult) -> String {
    let names: Vec<&str> = result
        .labels
        .iter()
        .flatten()
        .map(|l| l.as_deref().unwrap_or("unknown"))
        .collect();
    if names.is_empty() {
        format!("{} faces", result.boxes.len())
    } else {
        format!("{} faces: {}", result.boxes.len(), names.join(", "))
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref image) = cli.image {
        if !image.exists() {
            return Err(format!("Input image not found: {}", image.display()).into());
        }
    }
    if let Some(ref dir) = cli.gallery {
        if !dir.is_dir() {
            return Err(format!("Gallery directory not found: {}", dir.display()).into());
        }
    }
    if cli.ticks == 0 {
        return Err("Ticks must be at least 1".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(cli.display_scale > 0.0 && cli.display_scale <= 1.0) {
        return Err(format!(
            "Display scale must be in (0.0, 1.0], got {}",
            cli.display_scale
        )
        .into());
    }
    if !(cli.detection_scale > 0.0 && cli.detection_scale <= 1.0) {
        return Err(format!(
            "Detection scale must be in (0.0, 1.0], got {}",
            cli.detection_scale
        )
        .into());
    }
    if !(-1.0..=1.0).contains(&cli.match_threshold) {
        return Err(format!(
            "Match threshold must be between -1.0 and 1.0, got {}",
            cli.match_threshold
        )
        .into());
    }
    if cli.landmarks && cli.no_faces {
        log::warn!("--landmarks has no effect with --no-faces");
    }
    Ok(())
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}
