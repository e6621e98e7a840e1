use thiserror::Error;

/// Errors surfaced by the session orchestrator's public operations.
///
/// Only session-start errors (`Config`, `Extraction`) prevent a read from
/// beginning; per-section failures are recovered inside the playback loop
/// and never bubble out of it.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Extraction(String),

    /// Pause/resume issued with no active session.
    #[error("No audio playing")]
    NoActiveAudio,

    /// Pause issued while the session is not in the playing state.
    #[error("Session is not playing")]
    NotPlaying,

    /// Pause issued while playback is already paused.
    #[error("Audio is already paused")]
    AlreadyPaused,

    /// Resume issued while the session is not paused.
    #[error("Session is not paused")]
    NotPaused,
}
