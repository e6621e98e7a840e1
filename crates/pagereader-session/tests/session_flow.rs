//! End-to-end session behavior against the simulated playback driver.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use pagereader_foundation::TabId;
use pagereader_playback::{SimulatedDriver, SimulatedDriverConfig};
use pagereader_session::{SessionError, SessionOrchestrator, SessionStatus};
use pagereader_telemetry::SessionMetrics;

const PAGE: &str = "The intro paragraph.\n\n[Heading: Middle]\n\nThe closing paragraph.";

#[tokio::test(start_paused = true)]
async fn reads_every_section_in_order_to_completion() {
    let presenter = Arc::new(RecordingPresenter::default());
    let synth = Arc::new(MockSynthesizer::new(6400));
    let orch = orchestrator(
        StaticExtractor::new("Article", PAGE),
        synth.clone(),
        Arc::new(SimulatedDriver::default()),
        Some(presenter.clone()),
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| presenter.last_status() == Some(SessionStatus::Complete)).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.sessions_completed), 1);
    assert_eq!(SessionMetrics::get(&m.sections_played), 2);
    assert_eq!(SessionMetrics::get(&m.sections_skipped_heading), 1);
    assert_eq!(SessionMetrics::get(&m.sections_failed), 0);
    // Natural end beats the near-end fallback when both are available.
    assert_eq!(SessionMetrics::get(&m.completions_primary), 2);
    assert_eq!(SessionMetrics::get(&m.completions_near_end), 0);

    // Each content section is synthesized exactly once: the first inline,
    // the rest by the look-ahead pipeline.
    assert_eq!(synth.call_count(), 2);
    assert_eq!(SessionMetrics::get(&m.prefetch_hits), 1);

    let messages = presenter.messages();
    let expect = [
        "Extracting article content...",
        "Preparing section 1 of 3...",
        "Playing 1 of 3: Article",
        "Preparing section 2 of 3...",
        "Section 2 of 3: Middle",
        "Preparing section 3 of 3...",
        "Playing 3 of 3: Middle",
        "Finished reading the page",
    ];
    assert_eq!(messages, expect, "unexpected render order: {messages:?}");
}

#[tokio::test]
async fn missing_api_key_rejects_start_with_settings_hint() {
    let presenter = Arc::new(RecordingPresenter::default());
    let orch = Arc::new(SessionOrchestrator::new(
        Arc::new(StaticExtractor::new("Article", PAGE)),
        Arc::new(MockSynthesizer::new(640)),
        Arc::new(SimulatedDriver::default()),
        presenter.clone(),
        settings_without_key(),
    ));

    let err = orch.clone().start_session(TAB).await.unwrap_err();
    assert!(matches!(err, SessionError::Config(_)));
    assert!(err.to_string().contains("API key"));
    assert_eq!(presenter.last_status(), Some(SessionStatus::Error));
}

#[tokio::test]
async fn empty_page_is_an_extraction_error() {
    let orch = orchestrator(
        StaticExtractor::new("Blank", "   \n\n  "),
        Arc::new(MockSynthesizer::new(640)),
        Arc::new(SimulatedDriver::default()),
        None,
    );

    let err = orch.clone().start_session(TAB).await.unwrap_err();
    assert!(matches!(err, SessionError::Extraction(_)));
    assert!(err.to_string().contains("No content could be extracted"));
}

#[tokio::test(start_paused = true)]
async fn failed_sections_are_skipped_and_the_session_still_completes() {
    let presenter = Arc::new(RecordingPresenter::default());
    let synth = Arc::new(MockSynthesizer::failing_on(6400, &["paragraph"]));
    let orch = orchestrator(
        StaticExtractor::new("Article", PAGE),
        synth,
        Arc::new(SimulatedDriver::default()),
        Some(presenter.clone()),
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| presenter.last_status() == Some(SessionStatus::Complete)).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.sessions_completed), 1);
    assert_eq!(SessionMetrics::get(&m.sections_failed), 2);
    assert_eq!(SessionMetrics::get(&m.sections_played), 0);
    assert!(presenter
        .messages()
        .iter()
        .any(|msg| msg.contains("rate limited")));
}

#[tokio::test(start_paused = true)]
async fn one_failing_section_does_not_stop_the_rest() {
    let presenter = Arc::new(RecordingPresenter::default());
    let synth = Arc::new(MockSynthesizer::failing_on(6400, &["intro"]));
    let orch = orchestrator(
        StaticExtractor::new("Article", PAGE),
        synth,
        Arc::new(SimulatedDriver::default()),
        Some(presenter.clone()),
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| presenter.last_status() == Some(SessionStatus::Complete)).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.sections_failed), 1);
    assert_eq!(SessionMetrics::get(&m.sections_played), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_each_issue_exactly_one_driver_command() {
    let driver = Arc::new(CountingDriver::new(SimulatedDriver::default()));
    let orch = orchestrator(
        // One long section so playback is still live when we interact.
        StaticExtractor::new("Article", "A single long paragraph."),
        Arc::new(MockSynthesizer::new(320_000)),
        driver.clone(),
        None,
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| orch.snapshot().status == SessionStatus::Playing).await;

    orch.pause().await.unwrap();
    assert!(orch.snapshot().is_paused);
    assert!(matches!(orch.pause().await, Err(SessionError::AlreadyPaused)));
    assert_eq!(driver.pause_calls.load(Ordering::SeqCst), 1);

    orch.resume().await.unwrap();
    assert!(!orch.snapshot().is_paused);
    assert!(matches!(orch.resume().await, Err(SessionError::NotPaused)));
    assert_eq!(driver.resume_calls.load(Ordering::SeqCst), 1);

    orch.stop(TAB).await.unwrap();
}

#[tokio::test]
async fn pause_without_a_session_reports_no_audio_playing() {
    let orch = orchestrator(
        StaticExtractor::new("Article", PAGE),
        Arc::new(MockSynthesizer::new(640)),
        Arc::new(SimulatedDriver::default()),
        None,
    );

    let err = orch.pause().await.unwrap_err();
    assert!(matches!(err, SessionError::NoActiveAudio));
    assert_eq!(err.to_string(), "No audio playing");
    assert!(matches!(
        orch.resume().await,
        Err(SessionError::NoActiveAudio)
    ));
}

#[tokio::test(start_paused = true)]
async fn starting_a_new_session_supersedes_the_old_one() {
    let presenter = Arc::new(RecordingPresenter::default());
    let orch = orchestrator(
        StaticExtractor::new("Article", PAGE),
        Arc::new(MockSynthesizer::new(6400)),
        Arc::new(SimulatedDriver::default()),
        Some(presenter.clone()),
    );

    orch.clone().start_session(TabId(1)).await.unwrap();
    orch.clone().start_session(TabId(2)).await.unwrap();
    wait_until(|| presenter.last_status() == Some(SessionStatus::Complete)).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.sessions_superseded), 1);
    // Only the second session runs to completion.
    assert_eq!(SessionMetrics::get(&m.sessions_completed), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_tears_down_and_repeat_stop_is_a_no_op() {
    let presenter = Arc::new(RecordingPresenter::default());
    let driver = Arc::new(CountingDriver::new(SimulatedDriver::default()));
    let orch = orchestrator(
        StaticExtractor::new("Article", "A single long paragraph."),
        Arc::new(MockSynthesizer::new(320_000)),
        driver.clone(),
        Some(presenter.clone()),
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| orch.snapshot().status == SessionStatus::Playing).await;

    orch.stop(TAB).await.unwrap();
    orch.stop(TAB).await.unwrap();

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.sessions_stopped), 1);
    assert_eq!(SessionMetrics::get(&m.sessions_completed), 0);
    assert_eq!(presenter.last_status(), Some(SessionStatus::Idle));
    assert!(driver.stop_calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test(start_paused = true)]
async fn mid_session_settings_failure_ends_the_session_with_an_error() {
    let presenter = Arc::new(RecordingPresenter::default());
    let orch = Arc::new(SessionOrchestrator::new(
        Arc::new(StaticExtractor::new("Article", "A single long paragraph.")),
        Arc::new(MockSynthesizer::new(6400)),
        Arc::new(SimulatedDriver::default()),
        presenter.clone(),
        // One good load for session start; the inline synthesis load fails.
        Arc::new(ExpiringSettings::new(1)),
    ));

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| orch.snapshot().status == SessionStatus::Idle).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.sessions_completed), 0);
    assert_eq!(SessionMetrics::get(&m.sections_failed), 1);
    assert!(presenter
        .messages()
        .iter()
        .any(|msg| msg.contains("settings file unreadable")));
    assert!(presenter.statuses().contains(&SessionStatus::Error));
}

#[tokio::test(start_paused = true)]
async fn near_end_fallback_advances_when_the_end_signal_never_fires() {
    let presenter = Arc::new(RecordingPresenter::default());
    let driver = Arc::new(SimulatedDriver::new(SimulatedDriverConfig {
        withhold_ended: true,
        ..SimulatedDriverConfig::default()
    }));
    let orch = orchestrator(
        StaticExtractor::new("Article", "A single long paragraph."),
        Arc::new(MockSynthesizer::new(64_000)),
        driver,
        Some(presenter.clone()),
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| presenter.last_status() == Some(SessionStatus::Complete)).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.completions_primary), 0);
    assert_eq!(SessionMetrics::get(&m.completions_near_end), 1);
    assert_eq!(SessionMetrics::get(&m.sections_played), 1);
}

#[tokio::test(start_paused = true)]
async fn silent_output_hits_the_ceiling_and_still_advances() {
    let presenter = Arc::new(RecordingPresenter::default());
    let driver = Arc::new(SimulatedDriver::new(SimulatedDriverConfig {
        withhold_ended: true,
        emit_progress: false,
        ..SimulatedDriverConfig::default()
    }));
    let synth = Arc::new(MockSynthesizer::new(64_000));
    let orch = Arc::new(
        SessionOrchestrator::new(
            Arc::new(StaticExtractor::new("Article", "A single long paragraph.")),
            synth,
            driver,
            presenter.clone(),
            settings_with_key(),
        )
        .with_section_ceiling(Duration::from_secs(2)),
    );

    orch.clone().start_session(TAB).await.unwrap();
    wait_until(|| presenter.last_status() == Some(SessionStatus::Complete)).await;

    let m = orch.metrics();
    assert_eq!(SessionMetrics::get(&m.completions_forced_timeout), 1);
    // Forced advance is a silent recovery, never a user-visible error.
    assert!(!presenter
        .statuses()
        .contains(&SessionStatus::Error));
}
