use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facecap_core::{load_enrollment, storage, DetectionModel, Enrollment, OnnxFaceProvider};
use facecap_hw::{Camera, Window, CAPTURE_WINDOW, RECOGNITION_WINDOW};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod capture;
mod config;
mod menu;
mod recognize;
#[cfg(test)]
mod testing;

use config::Config;
use menu::MenuActions;

#[derive(Parser)]
#[command(name = "facecap", about = "Capture face images and recognize them live")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory with one folder of images per person
    #[arg(long, global = true)]
    faces_dir: Option<PathBuf>,

    /// Camera device path
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,
    /// Capture images of one person
    Capture {
        /// Person's name; images go to <faces-dir>/<name>/
        #[arg(short, long)]
        name: String,
    },
    /// Load known faces and start live recognition
    Recognize,
    /// Load known faces and report what was found
    Enroll,
}

/// Runs sessions against the real camera, windows and ONNX models.
struct LiveActions {
    config: Config,
}

impl LiveActions {
    fn load_provider(&self) -> Result<OnnxFaceProvider> {
        OnnxFaceProvider::load(&self.config.model_dir, self.config.match_threshold)
            .with_context(|| format!("loading face models from {}", self.config.model_dir.display()))
    }

    fn load_known_faces(&self, provider: &mut OnnxFaceProvider) -> Result<Enrollment> {
        let enrollment = load_enrollment(provider, &self.config.faces_dir, self.config.enroll_model)?;
        Ok(enrollment)
    }

    fn open_camera(&self) -> Result<Camera> {
        Camera::open(&self.config.camera_device)
            .with_context(|| format!("opening camera {}", self.config.camera_device))
    }

    fn enroll_report(&self) -> Result<()> {
        let mut provider = self.load_provider()?;
        let enrollment = self.load_known_faces(&mut provider)?;

        for (label, count) in enrollment.counts_by_label() {
            println!("{label}: {count}");
        }
        for path in enrollment.skipped() {
            println!("no face: {}", path.display());
        }
        println!("{} known faces loaded.", enrollment.len());
        Ok(())
    }
}

impl MenuActions for LiveActions {
    fn capture(&mut self, name: &str) -> Result<()> {
        let dir = storage::ensure_person_dir(&self.config.faces_dir, name)
            .with_context(|| format!("creating directory for {name:?}"))?;
        let mut camera = self.open_camera()?;
        let mut window = Window::open(CAPTURE_WINDOW)?;

        capture::run_capture(&mut camera, &mut window, &dir, name)?;
        Ok(())
    }

    fn recognize(&mut self) -> Result<()> {
        let mut provider = self.load_provider()?;
        let enrollment = self.load_known_faces(&mut provider)?;

        let mut camera = self.open_camera()?;
        let mut window = Window::open(RECOGNITION_WINDOW)?;

        recognize::run_recognition(&mut camera, &mut window, &mut provider, &enrollment)?;
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.faces_dir {
        config.faces_dir = dir;
    }
    if let Some(device) = cli.device {
        config.camera_device = device;
    }
    tracing::debug!(?config, "configuration loaded");

    if config.enroll_model == DetectionModel::Accurate {
        tracing::info!("encoding stored images with the accurate detector");
    }

    let mut actions = LiveActions { config };

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            menu::run_menu(&mut input, &mut out, &mut actions)?;
        }
        Commands::Capture { name } => actions.capture(name.trim())?,
        Commands::Recognize => actions.recognize()?,
        Commands::Enroll => actions.enroll_report()?,
    }

    Ok(())
}
