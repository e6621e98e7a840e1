use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use pagereader_extract::FileExtractor;
use pagereader_foundation::TabId;
use pagereader_playback::{PlaybackDriver, SimulatedDriver};
use pagereader_session::{SessionError, SessionOrchestrator, SessionSnapshot, UiPresenter};
use pagereader_telemetry::SessionMetrics;
use pagereader_tts::{OpenAiSynthesizer, SettingsProvider, TomlSettingsProvider, TtsSettings};

use crate::presenter::ConsolePresenter;

/// Options for assembling the PageReader runtime.
#[derive(Clone, Debug)]
pub struct AppRuntimeOptions {
    /// Text or markdown file standing in for the page to read.
    pub input: PathBuf,
    pub settings_path: PathBuf,
    /// Use the in-process simulated audio output instead of the sound card.
    pub simulated: bool,
}

impl AppRuntimeOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            settings_path: PathBuf::from("pagereader.toml"),
            simulated: false,
        }
    }
}

/// Handle to the assembled runtime.
pub struct AppHandle {
    orchestrator: Arc<SessionOrchestrator>,
    settings: Arc<TomlSettingsProvider>,
    metrics: SessionMetrics,
}

impl AppHandle {
    pub async fn read(&self, tab: TabId) -> Result<(), SessionError> {
        self.orchestrator.clone().start_session(tab).await
    }

    pub async fn pause(&self) -> Result<(), SessionError> {
        self.orchestrator.pause().await
    }

    pub async fn resume(&self) -> Result<(), SessionError> {
        self.orchestrator.resume().await
    }

    pub async fn stop(&self, tab: TabId) -> Result<(), SessionError> {
        self.orchestrator.stop(tab).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.orchestrator.snapshot()
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn settings_path(&self) -> &std::path::Path {
        self.settings.path()
    }

    pub async fn current_settings(&self) -> Result<TtsSettings, SessionError> {
        self.settings
            .get_settings()
            .await
            .map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Stop any active session and release the audio output.
    pub async fn shutdown(self) {
        info!("Shutting down PageReader runtime");
        if let Some(tab) = self.orchestrator.active_tab() {
            let _ = self.orchestrator.stop(tab).await;
        }
        let m = &self.metrics;
        info!(
            sessions = SessionMetrics::get(&m.sessions_started),
            completed = SessionMetrics::get(&m.sessions_completed),
            sections = SessionMetrics::get(&m.sections_played),
            "runtime stopped"
        );
    }
}

/// Build the orchestrator with its production collaborators.
pub fn start(opts: AppRuntimeOptions) -> anyhow::Result<AppHandle> {
    let driver = build_driver(&opts)?;
    let settings = Arc::new(TomlSettingsProvider::new(&opts.settings_path));
    let presenter: Arc<dyn UiPresenter> = Arc::new(ConsolePresenter);
    let metrics = SessionMetrics::new();

    let orchestrator = Arc::new(
        SessionOrchestrator::new(
            Arc::new(FileExtractor::new(&opts.input)),
            Arc::new(OpenAiSynthesizer::new()),
            driver,
            presenter,
            settings.clone(),
        )
        .with_metrics(metrics.clone()),
    );

    info!(
        input = %opts.input.display(),
        settings = %opts.settings_path.display(),
        simulated = opts.simulated,
        "PageReader runtime assembled"
    );
    Ok(AppHandle {
        orchestrator,
        settings,
        metrics,
    })
}

fn build_driver(opts: &AppRuntimeOptions) -> anyhow::Result<Arc<dyn PlaybackDriver>> {
    if opts.simulated {
        return Ok(Arc::new(SimulatedDriver::default()));
    }
    #[cfg(feature = "rodio")]
    {
        Ok(Arc::new(pagereader_playback::RodioDriver::new()))
    }
    #[cfg(not(feature = "rodio"))]
    {
        Err(anyhow::anyhow!(
            "built without the rodio feature; run with --simulated"
        ))
    }
}
