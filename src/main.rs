use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use food_scanner::intake::camera::StillImageDevice;
use food_scanner::{AppError, CycleOutcome, SelectedFile, Settings, Workflow, WorkflowState};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "food-scanner")]
#[command(about = "Estimate calories and protein from a photo of food")]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, env = "FOOD_SCANNER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image file
    Upload {
        file: PathBuf,
        /// MIME type to report instead of guessing from the extension
        #[arg(long)]
        mime: Option<String>,
    },

    /// Take one snapshot from a camera and analyze it
    Capture {
        /// Serve this image file as the camera stream
        #[arg(long)]
        still: PathBuf,
    },
}

fn init_logging(settings: &Settings) {
    let level = settings.logging.level.parse().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();
    let settings = match cli.config.as_deref() {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    init_logging(&settings);

    let builder = Workflow::builder(settings);
    let outcome = match cli.command {
        Commands::Upload { file, mime } => {
            let mut selected = SelectedFile::new(file);
            if let Some(mime) = mime {
                selected = selected.with_mime(mime);
            }
            builder.build()?.start_upload(selected).await?
        }
        Commands::Capture { still } => {
            builder
                .camera(StillImageDevice::new(still))
                .build()?
                .start_capture()
                .await?
        }
    };

    let snapshot = match outcome {
        CycleOutcome::Finished(snapshot) => snapshot,
        CycleOutcome::Discarded { cycle } => {
            info!("Cycle {} was discarded", cycle);
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(match snapshot.state {
        WorkflowState::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
