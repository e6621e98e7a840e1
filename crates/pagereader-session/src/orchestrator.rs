use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pagereader_extract::{sectionize, ContentExtractor, Section};
use pagereader_foundation::{AppError, RecoveryStrategy, TabId};
use pagereader_playback::{
    CompletionReason, CompletionWatch, PlaybackDriver, PlaybackError, SECTION_TIMEOUT_CEILING,
};
use pagereader_telemetry::SessionMetrics;
use pagereader_tts::{SettingsProvider, SpeechSynthesizer};

use crate::error::SessionError;
use crate::prefetch::{PrefetchPipeline, PrefetchedAudio};
use crate::presenter::UiPresenter;
use crate::session::{Session, SessionSnapshot, SessionStatus};
use crate::HEADING_SKIP_DELAY;

struct ActiveSession {
    session: Arc<Session>,
    playback_task: JoinHandle<()>,
    prefetch: Arc<PrefetchPipeline>,
}

/// Owns the section queue, the pause flag, and the pre-fetch pipeline;
/// sequences synthesis and playback and drives the UI presenter.
///
/// At most one session is active at a time: `start_session` tears down any
/// prior session — timers, listeners, pre-fetch, audio — before the new
/// one's first section begins.
pub struct SessionOrchestrator {
    extractor: Arc<dyn ContentExtractor>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    driver: Arc<dyn PlaybackDriver>,
    presenter: Arc<dyn UiPresenter>,
    settings: Arc<dyn SettingsProvider>,
    metrics: SessionMetrics,
    section_ceiling: Duration,
    active: Mutex<Option<ActiveSession>>,
    generation: AtomicU64,
}

impl SessionOrchestrator {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        driver: Arc<dyn PlaybackDriver>,
        presenter: Arc<dyn UiPresenter>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            extractor,
            synthesizer,
            driver,
            presenter,
            settings,
            metrics: SessionMetrics::new(),
            section_ceiling: SECTION_TIMEOUT_CEILING,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_metrics(mut self, metrics: SessionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Override the hard per-section completion ceiling.
    pub fn with_section_ceiling(mut self, ceiling: Duration) -> Self {
        self.section_ceiling = ceiling;
        self
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Tab of the active session, if any.
    pub fn active_tab(&self) -> Option<TabId> {
        self.active.lock().as_ref().map(|a| a.session.tab())
    }

    /// Snapshot of the active session, or the idle snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.active
            .lock()
            .as_ref()
            .map(|a| a.session.snapshot())
            .unwrap_or_else(SessionSnapshot::idle)
    }

    /// Start reading `tab`, superseding any active session on any tab.
    pub async fn start_session(self: Arc<Self>, tab: TabId) -> Result<(), SessionError> {
        // Supersede first: no stale timer or listener may outlive this
        // point, and no new audio exists until they are gone.
        if let Some(previous) = self.take_active() {
            info!(prev_tab = %previous.session.tab(), %tab, "superseding active session");
            SessionMetrics::incr(&self.metrics.sessions_superseded);
            self.teardown(previous).await;
        }

        // Surface a missing API key before extraction to avoid wasted work;
        // the synthesizer re-checks at request time as a fallback.
        let settings = match self.settings.get_settings().await {
            Ok(settings) => settings,
            Err(e) => return Err(self.abort_start(tab, AppError::Config(e.to_string())).await),
        };
        if !settings.has_api_key() {
            let err = AppError::Config(
                "OpenAI API key not set. Please add your API key in the settings.".to_string(),
            );
            return Err(self.abort_start(tab, err).await);
        }

        self.presenter
            .render(
                tab,
                SessionStatus::Reading,
                Some("Extracting article content...".to_string()),
                SessionSnapshot::idle(),
            )
            .await;

        let page = match self.extractor.extract(tab).await {
            Ok(page) => page,
            Err(e) => {
                return Err(self
                    .abort_start(tab, AppError::Extraction(e.to_string()))
                    .await)
            }
        };
        if let Some(note) = &page.error {
            warn!(%tab, note, "extraction reported a partial failure; using fallback content");
        }
        if page.is_empty() {
            let err = AppError::Extraction(
                "No content could be extracted from this page".to_string(),
            );
            return Err(self.abort_start(tab, err).await);
        }
        let sections = sectionize(&page.title, &page.content);
        info!(%tab, sections = sections.len(), title = %page.title, "starting read session");

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(Session::new(tab, generation, sections));
        self.metrics.mark_session_started();

        let prefetch = Arc::new(PrefetchPipeline::spawn(
            session.clone(),
            self.synthesizer.clone(),
            self.settings.clone(),
            self.metrics.clone(),
        ));
        let playback_task = tokio::spawn(run_sections(
            Arc::downgrade(&self),
            session.clone(),
            prefetch.clone(),
        ));

        *self.active.lock() = Some(ActiveSession {
            session,
            playback_task,
            prefetch,
        });
        Ok(())
    }

    /// Pause current playback; valid only while playing.
    pub async fn pause(&self) -> Result<(), SessionError> {
        let session = self.active_session().ok_or(SessionError::NoActiveAudio)?;
        if session.status() != SessionStatus::Playing {
            return Err(SessionError::NotPlaying);
        }
        if session.is_paused() {
            return Err(SessionError::AlreadyPaused);
        }
        // The flag flips first so a section that starts while the driver
        // command is in flight begins paused.
        session.set_paused(true);
        let result = self.driver.pause(session.tab()).await;
        self.presenter
            .render(session.tab(), SessionStatus::Playing, None, session.snapshot())
            .await;
        result.map_err(map_driver_error)
    }

    /// Resume paused playback; inverse of `pause`.
    pub async fn resume(&self) -> Result<(), SessionError> {
        let session = self.active_session().ok_or(SessionError::NoActiveAudio)?;
        if !session.is_paused() {
            return Err(SessionError::NotPaused);
        }
        session.set_paused(false);
        let result = self.driver.resume(session.tab()).await;
        self.presenter
            .render(session.tab(), SessionStatus::Playing, None, session.snapshot())
            .await;
        result.map_err(map_driver_error)
    }

    /// Stop the session; idempotent — succeeds with nothing active.
    pub async fn stop(&self, tab: TabId) -> Result<(), SessionError> {
        let Some(active) = self.take_active() else {
            debug!(%tab, "stop with no active session");
            return Ok(());
        };
        SessionMetrics::incr(&self.metrics.sessions_stopped);
        self.teardown(active).await;
        self.presenter
            .render(tab, SessionStatus::Idle, None, SessionSnapshot::idle())
            .await;
        Ok(())
    }

    fn active_session(&self) -> Option<Arc<Session>> {
        self.active.lock().as_ref().map(|a| a.session.clone())
    }

    fn take_active(&self) -> Option<ActiveSession> {
        self.active.lock().take()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Drop the active slot if it still belongs to `generation`; called by
    /// the playback task as it finishes.
    fn clear_if_current(&self, generation: u64) {
        let mut guard = self.active.lock();
        let matches = guard
            .as_ref()
            .map(|a| a.session.generation() == generation)
            .unwrap_or(false);
        if matches {
            if let Some(active) = guard.take() {
                active.prefetch.abort();
            }
        }
    }

    /// Cancel the playback loop, the pre-fetcher, and the audio output, in
    /// that order — detection must die before the output does, so a stale
    /// completion can never advance a newer session.
    async fn teardown(&self, active: ActiveSession) {
        active.playback_task.abort();
        active.prefetch.abort();
        active.session.set_status(SessionStatus::Idle);
        if let Err(e) = self.driver.stop(active.session.tab()).await {
            warn!(error = %e, "driver stop failed during teardown");
        }
        let _ = active.playback_task.await;
    }

    /// Render a session-start failure and convert it for the caller.
    async fn abort_start(&self, tab: TabId, err: AppError) -> SessionError {
        let err = session_error(err);
        self.presenter
            .render(
                tab,
                SessionStatus::Error,
                Some(err.to_string()),
                SessionSnapshot::idle(),
            )
            .await;
        err
    }

    /// Handle one section end to end. `Ok` means played or skipped; `Err`
    /// is recovered by the caller's skip-on-error policy.
    async fn play_section(
        &self,
        session: &Arc<Session>,
        section: &Section,
        prefetch: &PrefetchPipeline,
    ) -> Result<(), AppError> {
        let tab = session.tab();
        let ordinal = section.index + 1;
        let total = session.total_sections();

        session.set_status(SessionStatus::Reading);
        self.presenter
            .render(
                tab,
                SessionStatus::Reading,
                Some(format!("Preparing section {} of {}...", ordinal, total)),
                session.snapshot(),
            )
            .await;

        if section.is_heading() {
            // No audio; pulse the UI and let the caller advance.
            let _ = prefetch.take(section.index);
            session.set_status(SessionStatus::Playing);
            self.presenter
                .render(
                    tab,
                    SessionStatus::Playing,
                    Some(format!(
                        "Section {} of {}: {}",
                        ordinal, total, section.title
                    )),
                    session.snapshot(),
                )
                .await;
            SessionMetrics::incr(&self.metrics.sections_skipped_heading);
            tokio::time::sleep(HEADING_SKIP_DELAY).await;
            return Ok(());
        }

        let audio = match prefetch.take(section.index) {
            Some(entry) => match entry.payload {
                PrefetchedAudio::Audio(audio) => {
                    SessionMetrics::incr(&self.metrics.prefetch_hits);
                    audio
                }
                PrefetchedAudio::Failed(message) => {
                    return Err(AppError::Synthesis(message));
                }
                PrefetchedAudio::Heading => {
                    // Queue misalignment; fall back to an inline fetch.
                    SessionMetrics::incr(&self.metrics.prefetch_misses);
                    self.synthesize_inline(section).await?
                }
            },
            None => {
                SessionMetrics::incr(&self.metrics.prefetch_misses);
                self.synthesize_inline(section).await?
            }
        };

        let handle = self
            .driver
            .play(tab, audio, session.is_paused())
            .await
            .map_err(|e| AppError::Playback(e.to_string()))?;

        session.set_status(SessionStatus::Playing);
        self.presenter
            .render(
                tab,
                SessionStatus::Playing,
                Some(format!("Playing {} of {}: {}", ordinal, total, section.title)),
                session.snapshot(),
            )
            .await;

        let reason = CompletionWatch::new(handle)
            .with_ceiling(self.section_ceiling)
            .wait()
            .await;
        match reason {
            CompletionReason::Ended => {
                SessionMetrics::incr(&self.metrics.completions_primary);
            }
            CompletionReason::NearEnd => {
                SessionMetrics::incr(&self.metrics.completions_near_end);
            }
            CompletionReason::TimedOut => {
                // Silent recovery: forced advance, no user-visible error.
                warn!(%tab, section = ordinal, "section completion ceiling hit; forcing advance");
                SessionMetrics::incr(&self.metrics.completions_forced_timeout);
            }
            CompletionReason::DriverGone => {
                debug!(%tab, section = ordinal, "audio output went away before completing");
            }
        }
        SessionMetrics::incr(&self.metrics.sections_played);
        Ok(())
    }

    async fn synthesize_inline(&self, section: &Section) -> Result<Vec<u8>, AppError> {
        // Settings are re-read per call so key/voice edits apply mid-session;
        // a load failure here is a configuration problem, not a bad section.
        let settings = self
            .settings
            .get_settings()
            .await
            .map_err(|e| AppError::Config(e.to_string()))?;
        SessionMetrics::incr(&self.metrics.synth_requests);
        match self
            .synthesizer
            .synthesize(&section.content, Some(&section.title), &settings)
            .await
        {
            Ok(audio) => {
                self.metrics
                    .synth_bytes
                    .fetch_add(audio.len() as u64, Ordering::Relaxed);
                Ok(audio)
            }
            Err(e) => {
                SessionMetrics::incr(&self.metrics.synth_failures);
                Err(AppError::Synthesis(e.to_string()))
            }
        }
    }
}

fn map_driver_error(e: PlaybackError) -> SessionError {
    match e {
        PlaybackError::NoActiveAudio => SessionError::NoActiveAudio,
        other => SessionError::Config(other.to_string()),
    }
}

fn session_error(e: AppError) -> SessionError {
    match e {
        AppError::Extraction(message) => SessionError::Extraction(message),
        AppError::Config(message)
        | AppError::Synthesis(message)
        | AppError::Playback(message) => SessionError::Config(message),
    }
}

/// The session's playback loop: strictly ascending section order, one
/// completion per section, per-section failures recovered in place.
async fn run_sections(
    orch: Weak<SessionOrchestrator>,
    session: Arc<Session>,
    prefetch: Arc<PrefetchPipeline>,
) {
    let total = session.total_sections();
    loop {
        let Some(o) = orch.upgrade() else { return };
        if !o.is_current(session.generation()) {
            return;
        }

        let index = session.current_index();
        if index >= total {
            session.set_status(SessionStatus::Complete);
            SessionMetrics::incr(&o.metrics.sessions_completed);
            info!(tab = %session.tab(), sections = total, "finished reading the page");
            o.presenter
                .render(
                    session.tab(),
                    SessionStatus::Complete,
                    Some("Finished reading the page".to_string()),
                    session.snapshot(),
                )
                .await;
            o.clear_if_current(session.generation());
            return;
        }

        let section = session.sections[index].clone();
        if let Err(e) = o.play_section(&session, &section, &prefetch).await {
            session.set_status(SessionStatus::Error);
            SessionMetrics::incr(&o.metrics.sections_failed);
            o.presenter
                .render(
                    session.tab(),
                    SessionStatus::Error,
                    Some(format!("Error: {}", e)),
                    session.snapshot(),
                )
                .await;
            match e.recovery_strategy() {
                RecoveryStrategy::SkipSection { delay } => {
                    warn!(
                        tab = %session.tab(),
                        section = index + 1,
                        error = %e,
                        "section failed; will skip after backoff"
                    );
                    drop(o);
                    tokio::time::sleep(delay).await;
                }
                RecoveryStrategy::Abort => {
                    warn!(
                        tab = %session.tab(),
                        section = index + 1,
                        error = %e,
                        "unrecoverable mid-session error; ending session"
                    );
                    o.clear_if_current(session.generation());
                    return;
                }
            }
        } else {
            drop(o);
        }

        let Some(o) = orch.upgrade() else { return };
        if !o.is_current(session.generation()) {
            return;
        }
        session.advance_to(index + 1);
    }
}
