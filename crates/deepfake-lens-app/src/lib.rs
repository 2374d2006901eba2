#![warn(missing_docs)]
//! # deepfake-lens-app
//!
//! ## Purpose
//! Wires configuration, logging, the analysis client, and the session state
//! machine into the `deepfake-lens` runtime.
//!
//! ## Responsibilities
//! - Load [`AppConfig`] from environment variables.
//! - Initialize `env_logger` for the `log` facade.
//! - Run analyses off the caller thread through [`AnalysisController`].
//! - Render sessions and backend status as plain-text reports.
//!
//! ## Data flow
//! Env -> [`AppConfig`] -> [`build_client`] -> [`AnalysisController`] ->
//! worker thread -> [`DispatchEvent`] channel -> session -> [`render_report`].
//!
//! ## Ownership and lifetimes
//! The controller owns the session. Worker threads own a cloned client and
//! the ticket's file, and hand results back over an mpsc channel.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Analysis failures are not
//! app errors: they land in the session as `Error` status.

mod controller;

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use deepfake_lens_client::{
    AnalysisClient, ClientError, DEFAULT_API_BASE, DEFAULT_EVERY_N, DEFAULT_MAX_FRAMES,
    HttpTransport, VideoSampling,
};
use deepfake_lens_core::{AnalysisStatus, CoreError};
use deepfake_lens_ui::{
    AnalysisPresentation, BackendStatus, ImagePresentation, VideoPresentation, format_percentage,
    is_suspicious, loading_banner,
};
use deepfake_lens_workflow::{Session, WorkflowError};
use log::{info, warn};
use thiserror::Error;

pub use controller::{AnalysisController, DispatchEvent};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("DEEPFAKE_LENS_VERSION");

/// Env var holding the backend base URL.
pub const ENV_API_BASE: &str = "DEEPFAKE_LENS_API_BASE";
/// Env var holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "DEEPFAKE_LENS_TIMEOUT_SECS";
/// Env var holding the default video sampling stride.
pub const ENV_EVERY_N: &str = "DEEPFAKE_LENS_EVERY_N";
/// Env var holding the default video frame cap.
pub const ENV_MAX_FRAMES: &str = "DEEPFAKE_LENS_MAX_FRAMES";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Largest accepted request timeout in seconds (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL.
    pub api_base: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Default video sampling.
    pub sampling: VideoSampling,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sampling: VideoSampling::default(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for unparsable or non-positive values, a
    /// timeout above [`MAX_TIMEOUT_SECS`], and a base URL that is not http(s).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; unset keys take defaults.
    ///
    /// # Errors
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_base = lookup(ENV_API_BASE)
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        deepfake_lens_client::validate_api_base(&api_base)
            .map_err(|error| AppError::Config(format!("{ENV_API_BASE}: {error}")))?;

        let timeout_secs = positive_setting(&lookup, ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AppError::Config(format!(
                "{ENV_TIMEOUT_SECS} must be at most {MAX_TIMEOUT_SECS}, got {timeout_secs}"
            )));
        }
        let every_n = positive_setting(&lookup, ENV_EVERY_N, u64::from(DEFAULT_EVERY_N))?;
        let max_frames = positive_setting(&lookup, ENV_MAX_FRAMES, u64::from(DEFAULT_MAX_FRAMES))?;

        Ok(Self {
            api_base,
            timeout: Duration::from_secs(timeout_secs),
            sampling: sampling_from(every_n, max_frames)?,
        })
    }

    /// Returns a copy with sampling overridden where provided.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when an override is zero.
    pub fn with_sampling_overrides(
        mut self,
        every_n: Option<u32>,
        max_frames: Option<u32>,
    ) -> Result<Self, AppError> {
        let every_n = every_n.unwrap_or(self.sampling.every_n());
        let max_frames = max_frames.unwrap_or(self.sampling.max_frames());
        self.sampling = sampling_from(u64::from(every_n), u64::from(max_frames))?;
        Ok(self)
    }
}

fn positive_setting(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AppError::Config(format!(
            "{key} must be a positive integer, got {raw:?}"
        ))),
    }
}

fn sampling_from(every_n: u64, max_frames: u64) -> Result<VideoSampling, AppError> {
    let every_n = u32::try_from(every_n)
        .map_err(|_| AppError::Config(format!("{ENV_EVERY_N} is too large")))?;
    let max_frames = u32::try_from(max_frames)
        .map_err(|_| AppError::Config(format!("{ENV_MAX_FRAMES} is too large")))?;
    VideoSampling::new(every_n, max_frames).map_err(|error| AppError::Config(error.to_string()))
}

/// Installs `env_logger` with an `info` default filter.
///
/// `RUST_LOG` overrides the filter. Repeated calls are no-ops.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let initialized = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_ok();

    if initialized {
        info!("app | startup | version={}", app_version());
    }
}

/// Builds an HTTP-backed client for `config`.
///
/// # Errors
/// Returns [`AppError::Client`] when the base URL or HTTP client is invalid.
pub fn build_client(config: &AppConfig) -> Result<AnalysisClient, AppError> {
    let transport = HttpTransport::new(config.timeout)?;
    Ok(AnalysisClient::new(&config.api_base, Arc::new(transport))?)
}

/// Moves the key-frame carousel to `index` for the report.
///
/// Returns `false` and logs a warning when the result has no such key frame;
/// the session is left as it was.
pub fn focus_key_frame(session: &mut Session, index: usize) -> bool {
    match session.jump_to_key_frame(index) {
        Ok(_) => true,
        Err(navigation) => {
            warn!("app | key_frame_skipped | index={index} reason={navigation}");
            false
        }
    }
}

/// One-line backend status text.
pub fn render_backend_status(status: &BackendStatus) -> String {
    format!("backend: {}", status.label())
}

/// Plain-text report of the session.
pub fn render_report(session: &Session) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "mode: {}", session.mode());
    if let Some(file) = session.selected_file() {
        let _ = writeln!(
            report,
            "file: {} ({} bytes, {})",
            file.descriptor.name, file.descriptor.size_bytes, file.descriptor.mime
        );
    }
    if let Some(rejection) = session.rejection() {
        let _ = writeln!(report, "rejected: {rejection}");
    }

    match session.status() {
        AnalysisStatus::Complete => match session.result() {
            Some(AnalysisPresentation::Image(image)) => render_image(&mut report, image),
            Some(AnalysisPresentation::Video(video)) => render_video(&mut report, video),
            None => {}
        },
        AnalysisStatus::Error => {
            if let Some(failure) = session.failure() {
                let _ = writeln!(report, "error: {}", failure.message);
                if failure.visualization.is_some() {
                    let _ = writeln!(report, "visualization: attached");
                }
            }
        }
        status => {
            if let Some(banner) = loading_banner(status) {
                let _ = writeln!(report, "{}: {}", banner.title, banner.subtitle);
            } else {
                let _ = writeln!(report, "status: {}", status_label(status));
            }
        }
    }

    report
}

fn render_image(report: &mut String, image: &ImagePresentation) {
    let _ = writeln!(report, "{}", image.headline());
    let _ = writeln!(report, "verdict: {}", image.verdict.label());
    let _ = writeln!(
        report,
        "confidence: {} ({})",
        format_percentage(image.confidence),
        image.confidence_level.label()
    );
    for bar in image.bars() {
        let _ = writeln!(report, "{}: {}", bar.label, bar.percentage);
    }
    if let Some(face_detected) = image.face_detected {
        let _ = writeln!(report, "face detected: {}", if face_detected { "yes" } else { "no" });
    }
}

fn render_video(report: &mut String, video: &VideoPresentation) {
    let stats = video.stats();
    let _ = writeln!(report, "{}", video.headline());
    let _ = writeln!(report, "verdict: {}", video.verdict.label());
    let _ = writeln!(
        report,
        "confidence: {} ({})",
        format_percentage(video.confidence),
        video.confidence_level.label()
    );
    for bar in video.bars() {
        let _ = writeln!(report, "{}: {}", bar.label, bar.percentage);
    }
    let _ = writeln!(report, "fake probability: {}", stats.fake_percentage);
    let _ = writeln!(report, "frames: {}", stats.frames);
    let _ = writeln!(report, "duration: {}", stats.duration);
    let _ = writeln!(report, "variability: {} ({})", stats.deviation, video.variability.label());
    let _ = writeln!(report, "timeline points: {}", video.timeline.len());

    if let (Some(navigator), Some(frame)) = (video.navigator(), video.current_key_frame()) {
        let _ = writeln!(
            report,
            "key frame {}: frame #{} {}{}",
            navigator.position_label(),
            frame.frame_index,
            format_percentage(frame.fake_probability),
            if is_suspicious(frame.fake_probability) { " suspicious" } else { "" }
        );
    }
}

fn status_label(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Idle => "idle",
        AnalysisStatus::FileSelected => "file selected",
        AnalysisStatus::Uploading => "uploading",
        AnalysisStatus::Analyzing => "analyzing",
        AnalysisStatus::Complete => "complete",
        AnalysisStatus::Error => "error",
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid environment or CLI configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Client construction or request error.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    /// Illegal session operation.
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),
    /// File access error.
    #[error("file error: {0}")]
    Core(#[from] CoreError),
    /// Worker thread could not be started or stopped reporting.
    #[error("dispatch error: {0}")]
    Dispatch(String),
}
