#![warn(missing_docs)]
//! # deepfake-lens binary
//!
//! Command-line entry point: validates one file, analyzes it against the
//! configured backend, and prints a text report.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use deepfake_lens_app::{
    AnalysisController, AppConfig, AppError, app_version, build_client, focus_key_frame,
    init_logging, render_backend_status, render_report,
};
use deepfake_lens_core::{AnalysisMode, AnalysisStatus, MediaFile};
use deepfake_lens_workflow::WorkflowError;
use log::error;

const WAIT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(
    name = "deepfake-lens",
    version = app_version(),
    about = "Deepfake image and video analysis client"
)]
struct Args {
    /// Analysis mode
    #[arg(long, default_value = "image")]
    mode: AnalysisMode,
    /// Analyze every Nth video frame
    #[arg(long)]
    every_n: Option<u32>,
    /// Cap on analyzed video frames
    #[arg(long)]
    max_frames: Option<u32>,
    /// Query backend health before analyzing
    #[arg(long, default_value_t = false)]
    health: bool,
    /// Key frame to show in the video report
    #[arg(long)]
    key_frame: Option<usize>,
    /// File to analyze
    file: PathBuf,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(args) {
        Ok(AnalysisStatus::Complete) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(error) => {
            error!("app | aborted | {error}");
            eprintln!("deepfake-lens: {error}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<AnalysisStatus, AppError> {
    let config = AppConfig::from_env()?.with_sampling_overrides(args.every_n, args.max_frames)?;
    let client = build_client(&config)?;
    let mut controller = AnalysisController::new(client, config.sampling);

    if args.health {
        println!("{}", render_backend_status(&controller.check_health()));
    }

    controller.change_mode(args.mode);
    let file = MediaFile::from_path(&args.file)?;
    if let Err(rejection) = controller.select_file(file) {
        if let AppError::Workflow(WorkflowError::Rejected(_)) = &rejection {
            print!("{}", render_report(controller.session()));
        }
        return Err(rejection);
    }

    controller.start_analysis()?;
    let status = controller.wait_for_completion(config.timeout.saturating_add(WAIT_MARGIN))?;

    if let Some(index) = args.key_frame {
        if !focus_key_frame(controller.session_mut(), index) {
            eprintln!("deepfake-lens: key frame {index} is not available");
        }
    }

    print!("{}", render_report(controller.session()));
    Ok(status)
}
