use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Pause/resume issued with no active audio for the tab.
    #[error("No audio playing")]
    NoActiveAudio,

    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Playback channel error: {0}")]
    Channel(String),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
