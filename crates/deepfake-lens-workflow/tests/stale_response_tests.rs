//! Tests that abandoned requests never touch the session.

mod common;

use common::{clip, deepfake_image_payload, photo, video_payload};
use deepfake_lens_core::{AnalysisMode, AnalysisStatus};
use deepfake_lens_workflow::{Completion, Session};

#[test]
fn stale_response_tests_reset_discards_late_success() {
    let mut session = Session::new();
    session.select_file(photo()).expect("png should be accepted");
    let ticket = session.start_analysis().expect("start should succeed");

    session.reset();
    assert!(!session.is_in_flight());

    let outcome = session.complete_analysis(ticket.generation(), Ok(deepfake_image_payload()));
    assert_eq!(outcome, Completion::Stale);
    assert_eq!(session.status(), AnalysisStatus::Idle);
    assert!(session.result().is_none());
}

#[test]
fn stale_response_tests_mode_change_mid_flight_discards_late_response() {
    let mut session = Session::new();
    session.select_file(photo()).expect("png should be accepted");
    let ticket = session.start_analysis().expect("start should succeed");
    session.mark_request_sent(ticket.generation());

    session.change_mode(AnalysisMode::Video);
    assert_eq!(session.status(), AnalysisStatus::Idle);

    assert_eq!(session.mark_request_sent(ticket.generation()), Completion::Stale);
    let outcome = session.complete_analysis(ticket.generation(), Ok(deepfake_image_payload()));
    assert_eq!(outcome, Completion::Stale);
    assert_eq!(session.mode(), AnalysisMode::Video);
    assert!(session.result().is_none());
}

#[test]
fn stale_response_tests_old_ticket_cannot_complete_newer_request() {
    let mut session = Session::new();
    session.change_mode(AnalysisMode::Video);
    session.select_file(clip()).expect("mp4 should be accepted");
    let first = session.start_analysis().expect("start should succeed");

    session.reset();
    session.select_file(clip()).expect("mp4 should be accepted");
    let second = session.start_analysis().expect("restart should succeed");
    assert_ne!(first.generation(), second.generation());

    assert_eq!(
        session.complete_analysis(first.generation(), Ok(video_payload())),
        Completion::Stale
    );
    assert!(session.is_in_flight());

    assert_eq!(
        session.complete_analysis(second.generation(), Ok(video_payload())),
        Completion::Applied(AnalysisStatus::Complete)
    );
}

#[test]
fn stale_response_tests_duplicate_completion_is_ignored() {
    let mut session = Session::new();
    session.select_file(photo()).expect("png should be accepted");
    let ticket = session.start_analysis().expect("start should succeed");

    session.complete_analysis(ticket.generation(), Ok(deepfake_image_payload()));
    let before = session.clone();
    assert_eq!(
        session.complete_analysis(ticket.generation(), Ok(deepfake_image_payload())),
        Completion::Stale
    );
    assert_eq!(session, before);
}
