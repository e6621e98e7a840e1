//! Shared fixtures for session integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use pagereader_extract::{ContentExtractor, ExtractResult, ExtractedPage};
use pagereader_foundation::TabId;
use pagereader_playback::{PlaybackDriver, PlaybackHandle, PlaybackResult, SimulatedDriver};
use pagereader_session::{
    NullPresenter, SessionOrchestrator, SessionSnapshot, SessionStatus, UiPresenter,
};
use pagereader_tts::{SpeechSynthesizer, StaticSettings, TtsError, TtsResult, TtsSettings};

pub const TAB: TabId = TabId(7);

/// Extractor that always returns the same page text.
pub struct StaticExtractor {
    pub title: String,
    pub content: String,
}

impl StaticExtractor {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

#[async_trait]
impl ContentExtractor for StaticExtractor {
    async fn extract(&self, _tab: TabId) -> ExtractResult<ExtractedPage> {
        Ok(ExtractedPage {
            title: self.title.clone(),
            content: self.content.clone(),
            error: None,
        })
    }
}

/// Synthesizer that records every request and fails on marked inputs.
pub struct MockSynthesizer {
    /// Byte length of each returned clip; drives simulated clip duration.
    pub clip_bytes: usize,
    /// Inputs containing any of these substrings fail with an API error.
    pub fail_matching: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new(clip_bytes: usize) -> Self {
        Self {
            clip_bytes,
            fail_matching: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(clip_bytes: usize, markers: &[&str]) -> Self {
        Self {
            clip_bytes,
            fail_matching: markers.iter().map(|m| m.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _title: Option<&str>,
        _settings: &TtsSettings,
    ) -> TtsResult<Vec<u8>> {
        self.calls.lock().push(text.to_string());
        if self.fail_matching.iter().any(|m| text.contains(m)) {
            return Err(TtsError::Api {
                status: 429,
                message: "rate limited".to_string(),
            });
        }
        Ok(vec![0u8; self.clip_bytes])
    }
}

/// Presenter that records every render call in order.
#[derive(Default)]
pub struct RecordingPresenter {
    pub events: Mutex<Vec<(SessionStatus, Option<String>, SessionSnapshot)>>,
}

impl RecordingPresenter {
    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.events.lock().iter().map(|(s, _, _)| *s).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|(_, m, _)| m.clone())
            .collect()
    }

    pub fn last_status(&self) -> Option<SessionStatus> {
        self.events.lock().last().map(|(s, _, _)| *s)
    }
}

#[async_trait]
impl UiPresenter for RecordingPresenter {
    async fn render(
        &self,
        _tab: TabId,
        status: SessionStatus,
        message: Option<String>,
        snapshot: SessionSnapshot,
    ) {
        self.events.lock().push((status, message, snapshot));
    }
}

/// Counts driver commands while delegating to the simulated driver.
pub struct CountingDriver {
    inner: SimulatedDriver,
    pub pause_calls: AtomicUsize,
    pub resume_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl CountingDriver {
    pub fn new(inner: SimulatedDriver) -> Self {
        Self {
            inner,
            pause_calls: AtomicUsize::new(0),
            resume_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PlaybackDriver for CountingDriver {
    async fn play(
        &self,
        tab: TabId,
        audio: Vec<u8>,
        start_paused: bool,
    ) -> PlaybackResult<PlaybackHandle> {
        self.inner.play(tab, audio, start_paused).await
    }

    async fn pause(&self, tab: TabId) -> PlaybackResult<()> {
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.pause(tab).await
    }

    async fn resume(&self, tab: TabId) -> PlaybackResult<()> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resume(tab).await
    }

    async fn stop(&self, tab: TabId) -> PlaybackResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.stop(tab).await
    }
}

/// Settings source that works for a fixed number of loads, then fails.
pub struct ExpiringSettings {
    ok_loads: AtomicUsize,
}

impl ExpiringSettings {
    pub fn new(ok_loads: usize) -> Self {
        Self {
            ok_loads: AtomicUsize::new(ok_loads),
        }
    }
}

#[async_trait]
impl pagereader_tts::SettingsProvider for ExpiringSettings {
    async fn get_settings(&self) -> TtsResult<TtsSettings> {
        let remaining = self.ok_loads.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            n.checked_sub(1)
        });
        if remaining.is_err() {
            return Err(pagereader_tts::TtsError::Settings(
                "settings file unreadable".to_string(),
            ));
        }
        Ok(TtsSettings {
            api_key: "sk-test".to_string(),
            ..TtsSettings::default()
        })
    }
}

pub fn settings_with_key() -> Arc<StaticSettings> {
    Arc::new(StaticSettings(TtsSettings {
        api_key: "sk-test".to_string(),
        ..TtsSettings::default()
    }))
}

pub fn settings_without_key() -> Arc<StaticSettings> {
    Arc::new(StaticSettings(TtsSettings::default()))
}

/// Orchestrator wired with the standard mocks; the presenter defaults to
/// `NullPresenter` unless one is supplied.
pub fn orchestrator(
    extractor: StaticExtractor,
    synthesizer: Arc<MockSynthesizer>,
    driver: Arc<dyn PlaybackDriver>,
    presenter: Option<Arc<dyn UiPresenter>>,
) -> Arc<SessionOrchestrator> {
    let presenter = presenter.unwrap_or_else(|| Arc::new(NullPresenter));
    Arc::new(SessionOrchestrator::new(
        Arc::new(extractor),
        synthesizer,
        driver,
        presenter,
        settings_with_key(),
    ))
}

/// Poll a condition under the paused tokio clock until it holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..100_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
