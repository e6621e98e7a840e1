use thiserror::Error;

/// Errors from speech synthesis.
#[derive(Error, Debug)]
pub enum TtsError {
    /// Missing or rejected API key.
    #[error("OpenAI API key not set. Please add your API key in the settings.")]
    Auth,

    /// Non-success response; message extracted from the error body when the
    /// body parses, otherwise a status-line fallback.
    #[error("API error: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type TtsResult<T> = Result<T, TtsError>;
