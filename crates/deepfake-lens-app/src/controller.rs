//! Background dispatch of analysis requests.
//!
//! The controller owns the [`Session`]. Each accepted start spawns one named
//! worker thread that runs the blocking client call and reports back through
//! an mpsc channel; the owner drains events with [`AnalysisController::poll`]
//! or blocks in [`AnalysisController::wait_for_completion`].

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

use deepfake_lens_analysis_contract::AnalysisPayload;
use deepfake_lens_client::{AnalysisClient, ClientError, VideoSampling};
use deepfake_lens_core::{AnalysisMode, AnalysisStatus, MediaFile};
use deepfake_lens_ui::BackendStatus;
use deepfake_lens_workflow::{Completion, Session};
use log::{debug, error, info, warn};

use crate::AppError;

/// Message sent from a worker thread to the session owner.
#[derive(Debug)]
pub enum DispatchEvent {
    /// Request is about to go on the wire.
    RequestSent {
        /// Ticket generation.
        generation: u64,
    },
    /// Request finished.
    Finished {
        /// Ticket generation.
        generation: u64,
        /// Parsed payload or client failure.
        outcome: Result<AnalysisPayload, ClientError>,
    },
}

/// Session owner that runs analyses on worker threads.
pub struct AnalysisController {
    client: AnalysisClient,
    sampling: VideoSampling,
    session: Session,
    event_tx: Sender<DispatchEvent>,
    event_rx: Receiver<DispatchEvent>,
}

impl AnalysisController {
    /// Creates a controller with an idle session.
    pub fn new(client: AnalysisClient, sampling: VideoSampling) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            client,
            sampling,
            session: Session::new(),
            event_tx,
            event_rx,
        }
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable session access for selection and navigation.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Video sampling used for the next video request.
    pub fn sampling(&self) -> VideoSampling {
        self.sampling
    }

    /// Replaces the video sampling used for later requests.
    pub fn set_sampling(&mut self, sampling: VideoSampling) {
        self.sampling = sampling;
    }

    /// Validates and selects a file.
    ///
    /// # Errors
    /// Returns [`AppError::Workflow`] for rejections and mid-flight calls.
    pub fn select_file(&mut self, file: MediaFile) -> Result<(), AppError> {
        Ok(self.session.select_file(file)?)
    }

    /// Switches mode; any outstanding request is abandoned.
    pub fn change_mode(&mut self, mode: AnalysisMode) {
        self.session.change_mode(mode);
    }

    /// Returns to idle; any outstanding request is abandoned.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Starts an analysis on a worker thread and returns its generation.
    ///
    /// # Errors
    /// Returns [`AppError::Workflow`] when the session refuses the start, and
    /// [`AppError::Dispatch`] when the worker thread cannot be spawned (the
    /// session is moved to `Error` in that case).
    pub fn start_analysis(&mut self) -> Result<u64, AppError> {
        let ticket = self.session.start_analysis()?;
        let generation = ticket.generation();
        let client = self.client.clone();
        let sampling = self.sampling;
        let event_tx = self.event_tx.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("analysis-{generation}"))
            .spawn(move || {
                let _ = event_tx.send(DispatchEvent::RequestSent { generation });
                let outcome = client.analyze(ticket.mode(), ticket.file(), sampling);
                let _ = event_tx.send(DispatchEvent::Finished {
                    generation,
                    outcome,
                });
            });

        if let Err(spawn_error) = spawned {
            let detail = format!("failed to spawn analysis worker: {spawn_error}");
            error!("dispatch | spawn_failed | generation={generation} {detail}");
            self.session
                .complete_analysis(generation, Err(ClientError::Transport(detail.clone())));
            return Err(AppError::Dispatch(detail));
        }

        info!("dispatch | spawned | generation={generation}");
        Ok(generation)
    }

    /// Applies every pending worker event and returns how many were applied.
    ///
    /// Events for abandoned generations are drained and dropped.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    if self.apply(event) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Blocks until the outstanding request settles or `timeout` elapses.
    ///
    /// Returns immediately when nothing is in flight. A timeout too large to
    /// represent as a deadline waits without one.
    ///
    /// # Errors
    /// Returns [`AppError::Dispatch`] on timeout.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> Result<AnalysisStatus, AppError> {
        let deadline = Instant::now().checked_add(timeout);
        self.poll();

        while self.session.is_in_flight() {
            let received = match deadline {
                Some(deadline) => self
                    .event_rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .event_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(event) => {
                    self.apply(event);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    warn!(
                        "dispatch | wait_timeout | generation={} timeout_ms={}",
                        self.session.generation(),
                        timeout.as_millis()
                    );
                    return Err(AppError::Dispatch(format!(
                        "analysis did not finish within {}s",
                        timeout.as_secs()
                    )));
                }
            }
        }

        Ok(self.session.status())
    }

    /// Runs a health check on the caller thread.
    pub fn check_health(&self) -> BackendStatus {
        match self.client.check_health() {
            Ok(health) => {
                info!(
                    "dispatch | health | status={} model_loaded={} device={}",
                    health.status, health.model_loaded, health.device
                );
                BackendStatus::from_health(Some(&health))
            }
            Err(error) => {
                warn!("dispatch | health_failed | {error}");
                BackendStatus::from_health(None)
            }
        }
    }

    fn apply(&mut self, event: DispatchEvent) -> bool {
        let completion = match event {
            DispatchEvent::RequestSent { generation } => {
                self.session.mark_request_sent(generation)
            }
            DispatchEvent::Finished {
                generation,
                outcome,
            } => self.session.complete_analysis(generation, outcome),
        };

        match completion {
            Completion::Applied(status) => {
                debug!("dispatch | applied | status={status:?}");
                true
            }
            Completion::Stale => false,
        }
    }
}
