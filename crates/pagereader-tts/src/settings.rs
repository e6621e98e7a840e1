use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{TtsError, TtsResult};
use crate::types::TtsSettings;

/// Supplies TTS configuration; defaults applied when absent.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get_settings(&self) -> TtsResult<TtsSettings>;
}

/// Settings loaded from a TOML file with `PAGEREADER_*` environment
/// overrides (e.g. `PAGEREADER_API_KEY`). A missing file yields defaults.
pub struct TomlSettingsProvider {
    path: PathBuf,
}

impl TomlSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SettingsProvider for TomlSettingsProvider {
    async fn get_settings(&self) -> TtsResult<TtsSettings> {
        let source = config::File::from(self.path.as_path()).required(false);
        let settings = config::Config::builder()
            .add_source(source)
            .add_source(config::Environment::with_prefix("PAGEREADER"))
            .build()
            .map_err(|e| TtsError::Settings(e.to_string()))?
            .try_deserialize::<TtsSettings>()
            .map_err(|e| TtsError::Settings(e.to_string()))?
            .normalize();

        debug!(
            path = %self.path.display(),
            model = %settings.model,
            voice = %settings.voice,
            has_key = settings.has_api_key(),
            "loaded TTS settings"
        );
        Ok(settings)
    }
}

/// Fixed settings, for tests and wiring overrides.
pub struct StaticSettings(pub TtsSettings);

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn get_settings(&self) -> TtsResult<TtsSettings> {
        Ok(self.0.clone().normalize())
    }
}
