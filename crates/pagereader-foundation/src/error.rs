use std::time::Duration;
use thiserror::Error;

/// Application-level error taxonomy.
///
/// Session-start errors (`Config`, `Extraction`) abort the read before it
/// begins. Per-section errors (`Synthesis`, `Playback`) are recovered locally:
/// the session renders the error and advances past the bad section.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Playback error: {0}")]
    Playback(String),
}

#[derive(Debug, Clone)]
pub enum RecoveryStrategy {
    /// Render the error, wait, then move on to the next section.
    SkipSection { delay: Duration },
    /// The session cannot continue; surface the error to the user.
    Abort,
}

impl AppError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            AppError::Synthesis(_) | AppError::Playback(_) => RecoveryStrategy::SkipSection {
                delay: Duration::from_secs(1),
            },
            AppError::Config(_) | AppError::Extraction(_) => RecoveryStrategy::Abort,
        }
    }
}
