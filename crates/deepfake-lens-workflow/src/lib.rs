#![warn(missing_docs)]
//! # deepfake-lens-workflow
//!
//! ## Purpose
//! Owns the analysis session and its lifecycle state machine.
//!
//! ## Responsibilities
//! - Validate file selections and keep rejections apart from session errors.
//! - Enforce legal transitions `Idle -> FileSelected -> Uploading ->
//!   Analyzing -> Complete | Error`.
//! - Allow at most one outstanding request and discard stale responses by
//!   generation.
//! - Hold the normalized result and forward key-frame navigation to it.
//!
//! ## Data flow
//! [`Session::select_file`] -> [`Session::start_analysis`] returns an
//! [`AnalysisTicket`] -> caller runs the client call -> caller reports
//! [`Session::mark_request_sent`] and [`Session::complete_analysis`] with the
//! ticket generation.
//!
//! ## Ownership and lifetimes
//! The session exclusively owns its result. Tickets own a clone of the
//! selected file so the request can run elsewhere without borrowing the
//! session.
//!
//! ## Error model
//! Illegal transitions return [`WorkflowError`] and leave the session
//! untouched. Analysis failures are not errors of this API: they move the
//! session to [`AnalysisStatus::Error`] with a display message.
//!
//! ## Example
//! ```rust
//! use deepfake_lens_core::{AnalysisMode, AnalysisStatus, MediaFile};
//! use deepfake_lens_workflow::Session;
//!
//! let mut session = Session::new();
//! session.select_file(MediaFile::from_bytes("face.jpg", vec![0_u8; 64])).unwrap();
//! let ticket = session.start_analysis().unwrap();
//! assert_eq!(ticket.mode(), AnalysisMode::Image);
//! assert_eq!(session.status(), AnalysisStatus::Uploading);
//! assert!(session.start_analysis().is_err());
//! ```

use deepfake_lens_analysis_contract::{AnalysisOperation, AnalysisPayload, KeyFrame};
use deepfake_lens_client::ClientError;
use deepfake_lens_core::{AnalysisMode, AnalysisStatus, MediaFile, ValidationError, validate_file};
use deepfake_lens_ui::{AnalysisPresentation, NavigationError, VideoPresentation, normalize};
use log::{debug, info, warn};
use thiserror::Error;

/// Failure shown in the session-wide error surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    /// Human-readable message.
    pub message: String,
    /// Illustrative visualization returned with the failure, if any.
    pub visualization: Option<String>,
}

/// Handle for one dispatched analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
    mode: AnalysisMode,
    file: MediaFile,
}

impl AnalysisTicket {
    /// Request generation; responses must quote it back.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mode at dispatch time.
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// File to upload.
    pub fn file(&self) -> &MediaFile {
        &self.file
    }
}

/// Whether an event was applied to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Event matched the in-flight request; carries the resulting status.
    Applied(AnalysisStatus),
    /// Event belonged to an abandoned or unknown request and was dropped.
    Stale,
}

/// Root state of one analysis attempt.
///
/// Invariants:
/// - `result` and the session failure are never both present.
/// - A request is outstanding exactly when the status is `Uploading` or
///   `Analyzing`.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    mode: AnalysisMode,
    status: AnalysisStatus,
    selected_file: Option<MediaFile>,
    result: Option<AnalysisPresentation>,
    failure: Option<SessionFailure>,
    rejection: Option<ValidationError>,
    generation: u64,
    in_flight: Option<u64>,
}

impl Session {
    /// Creates an idle image-mode session.
    pub fn new() -> Self {
        Self {
            mode: AnalysisMode::Image,
            status: AnalysisStatus::Idle,
            selected_file: None,
            result: None,
            failure: None,
            rejection: None,
            generation: 0,
            in_flight: None,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Current lifecycle status.
    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    /// Accepted file, if any.
    pub fn selected_file(&self) -> Option<&MediaFile> {
        self.selected_file.as_ref()
    }

    /// Normalized result of the last completed analysis.
    pub fn result(&self) -> Option<&AnalysisPresentation> {
        self.result.as_ref()
    }

    /// Session-wide failure of the last attempt.
    pub fn failure(&self) -> Option<&SessionFailure> {
        self.failure.as_ref()
    }

    /// Session-wide error message.
    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|failure| failure.message.as_str())
    }

    /// Last file-picker rejection; cleared on the next selection attempt.
    pub fn rejection(&self) -> Option<&ValidationError> {
        self.rejection.as_ref()
    }

    /// Generation of the most recent request (0 before the first one).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validates and selects a file.
    ///
    /// # Errors
    /// Returns [`WorkflowError::AnalysisInFlight`] mid-flight, or
    /// [`WorkflowError::Rejected`] when validation fails. A rejection only
    /// populates [`Self::rejection`]; status, file, and result are unchanged.
    pub fn select_file(&mut self, file: MediaFile) -> Result<(), WorkflowError> {
        if self.is_in_flight() {
            return Err(WorkflowError::AnalysisInFlight);
        }

        self.rejection = None;
        if let Err(rejection) = validate_file(self.mode, &file.descriptor) {
            warn!(
                "workflow | file_rejected | name={} size={} mode={} reason={rejection}",
                file.descriptor.name, file.descriptor.size_bytes, self.mode
            );
            self.rejection = Some(rejection.clone());
            return Err(WorkflowError::Rejected(rejection));
        }

        info!(
            "workflow | file_selected | name={} size={} mode={}",
            file.descriptor.name, file.descriptor.size_bytes, self.mode
        );
        self.selected_file = Some(file);
        self.result = None;
        self.failure = None;
        self.status = AnalysisStatus::FileSelected;
        Ok(())
    }

    /// Switches mode and clears the selection, result, and errors.
    ///
    /// An outstanding request is abandoned; its late response is dropped.
    pub fn change_mode(&mut self, mode: AnalysisMode) {
        info!("workflow | mode_changed | from={} to={mode}", self.mode);
        self.mode = mode;
        self.clear();
    }

    /// Returns to idle, keeping the mode.
    ///
    /// An outstanding request is abandoned; its late response is dropped.
    pub fn reset(&mut self) {
        info!("workflow | reset | mode={}", self.mode);
        self.clear();
    }

    /// Starts an analysis of the selected file.
    ///
    /// Accepted from `FileSelected`, and from `Error` while the failed file is
    /// still selected.
    ///
    /// # Errors
    /// Returns [`WorkflowError::AnalysisInFlight`] when a request is
    /// outstanding, [`WorkflowError::NoFileSelected`] without a file, and
    /// [`WorkflowError::InvalidTransition`] from other states.
    pub fn start_analysis(&mut self) -> Result<AnalysisTicket, WorkflowError> {
        if self.is_in_flight() {
            return Err(WorkflowError::AnalysisInFlight);
        }

        let Some(file) = self.selected_file.clone() else {
            return Err(WorkflowError::NoFileSelected);
        };

        if !matches!(self.status, AnalysisStatus::FileSelected | AnalysisStatus::Error) {
            return Err(WorkflowError::InvalidTransition {
                from: self.status,
                action: "start_analysis",
            });
        }

        self.generation = self.generation.saturating_add(1);
        self.in_flight = Some(self.generation);
        self.status = AnalysisStatus::Uploading;
        self.failure = None;
        info!(
            "workflow | analysis_started | generation={} mode={} name={}",
            self.generation, self.mode, file.descriptor.name
        );

        Ok(AnalysisTicket {
            generation: self.generation,
            mode: self.mode,
            file,
        })
    }

    /// Records that the request for `generation` is on the wire.
    pub fn mark_request_sent(&mut self, generation: u64) -> Completion {
        if self.in_flight != Some(generation) {
            debug!("workflow | stale_event | kind=request_sent generation={generation}");
            return Completion::Stale;
        }

        if self.status == AnalysisStatus::Uploading {
            self.status = AnalysisStatus::Analyzing;
            debug!("workflow | analyzing | generation={generation}");
        }
        Completion::Applied(self.status)
    }

    /// Applies the outcome of the request for `generation`.
    ///
    /// Success is normalized into the result; any failure (transport, remote,
    /// `success: false`, missing result) moves the session to `Error`.
    pub fn complete_analysis(
        &mut self,
        generation: u64,
        outcome: Result<AnalysisPayload, ClientError>,
    ) -> Completion {
        if self.in_flight != Some(generation) {
            debug!("workflow | stale_event | kind=completed generation={generation}");
            return Completion::Stale;
        }
        self.in_flight = None;

        let failure = match outcome {
            Ok(payload) if payload.mode() != self.mode => SessionFailure {
                message: AnalysisOperation::for_mode(self.mode)
                    .failure_fallback()
                    .to_string(),
                visualization: None,
            },
            Ok(payload) => match normalize(payload) {
                Ok(presentation) => {
                    self.result = Some(presentation);
                    self.failure = None;
                    self.status = AnalysisStatus::Complete;
                    info!("workflow | analysis_complete | generation={generation}");
                    return Completion::Applied(self.status);
                }
                Err(failure) => SessionFailure {
                    message: failure.message,
                    visualization: failure.visualization,
                },
            },
            Err(error) => SessionFailure {
                message: error.user_message(),
                visualization: None,
            },
        };

        warn!(
            "workflow | analysis_failed | generation={generation} message={}",
            failure.message
        );
        self.result = None;
        self.failure = Some(failure);
        self.status = AnalysisStatus::Error;
        Completion::Applied(self.status)
    }

    /// Key frame under the carousel cursor of a video result.
    pub fn current_key_frame(&self) -> Option<&KeyFrame> {
        match &self.result {
            Some(AnalysisPresentation::Video(video)) => video.current_key_frame(),
            _ => None,
        }
    }

    /// Steps the key-frame carousel forward.
    ///
    /// # Errors
    /// Returns [`WorkflowError::Navigation`] without a navigable video result.
    pub fn next_key_frame(&mut self) -> Result<usize, WorkflowError> {
        Ok(self.video_mut()?.next_key_frame()?)
    }

    /// Steps the key-frame carousel backward.
    ///
    /// # Errors
    /// Returns [`WorkflowError::Navigation`] without a navigable video result.
    pub fn previous_key_frame(&mut self) -> Result<usize, WorkflowError> {
        Ok(self.video_mut()?.previous_key_frame()?)
    }

    /// Moves the key-frame carousel to `index`.
    ///
    /// # Errors
    /// Returns [`WorkflowError::Navigation`] without a navigable video result
    /// or for an out-of-range index.
    pub fn jump_to_key_frame(&mut self, index: usize) -> Result<usize, WorkflowError> {
        Ok(self.video_mut()?.jump_to_key_frame(index)?)
    }

    fn video_mut(&mut self) -> Result<&mut VideoPresentation, WorkflowError> {
        match &mut self.result {
            Some(AnalysisPresentation::Video(video)) => Ok(video),
            _ => Err(WorkflowError::Navigation(NavigationError::NoKeyFrames)),
        }
    }

    fn clear(&mut self) {
        if let Some(abandoned) = self.in_flight.take() {
            info!("workflow | request_abandoned | generation={abandoned}");
        }
        self.selected_file = None;
        self.result = None;
        self.failure = None;
        self.rejection = None;
        self.status = AnalysisStatus::Idle;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors returned for illegal session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A request is already outstanding.
    #[error("an analysis is already in progress")]
    AnalysisInFlight,
    /// No file has been selected.
    #[error("no file selected")]
    NoFileSelected,
    /// Operation is not legal from the current status.
    #[error("cannot {action} while {from:?}")]
    InvalidTransition {
        /// Status at the time of the call.
        from: AnalysisStatus,
        /// Attempted operation.
        action: &'static str,
    },
    /// File failed validation.
    #[error("{0}")]
    Rejected(ValidationError),
    /// Key-frame navigation failed.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

#[cfg(test)]
mod tests {
    //! Unit tests for transition guards.

    use super::*;

    fn photo() -> MediaFile {
        MediaFile::from_bytes("face.png", vec![0_u8; 32])
    }

    #[test]
    fn new_session_is_idle_image_mode() {
        let session = Session::new();
        assert_eq!(session.mode(), AnalysisMode::Image);
        assert_eq!(session.status(), AnalysisStatus::Idle);
        assert!(session.selected_file().is_none());
    }

    #[test]
    fn start_requires_selected_file() {
        let mut session = Session::new();
        assert_eq!(session.start_analysis(), Err(WorkflowError::NoFileSelected));
    }

    #[test]
    fn request_sent_moves_uploading_to_analyzing_once() {
        let mut session = Session::new();
        session.select_file(photo()).unwrap();
        let ticket = session.start_analysis().unwrap();

        assert_eq!(
            session.mark_request_sent(ticket.generation()),
            Completion::Applied(AnalysisStatus::Analyzing)
        );
        assert_eq!(session.mark_request_sent(ticket.generation() + 1), Completion::Stale);
        assert_eq!(session.status(), AnalysisStatus::Analyzing);
    }

    #[test]
    fn selection_is_blocked_mid_flight() {
        let mut session = Session::new();
        session.select_file(photo()).unwrap();
        session.start_analysis().unwrap();
        assert_eq!(session.select_file(photo()), Err(WorkflowError::AnalysisInFlight));
    }

    #[test]
    fn navigation_without_video_result_is_rejected() {
        let mut session = Session::new();
        assert_eq!(
            session.next_key_frame(),
            Err(WorkflowError::Navigation(NavigationError::NoKeyFrames))
        );
    }
}
