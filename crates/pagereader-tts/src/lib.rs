//! Speech synthesis layer for PageReader.
//!
//! Wraps the OpenAI speech endpoint behind the `SpeechSynthesizer` trait,
//! carries the user-facing TTS settings (voice, model, tone, speed) and the
//! catalog of supported values, and bounds per-call input size.

pub mod client;
pub mod error;
pub mod input;
pub mod settings;
pub mod types;

pub use client::{OpenAiSynthesizer, SpeechSynthesizer};
pub use error::{TtsError, TtsResult};
pub use input::{build_input, MAX_INPUT_CHARS};
pub use settings::{SettingsProvider, StaticSettings, TomlSettingsProvider};
pub use types::{tone_instruction, TtsSettings, TTS_MODELS, TTS_TONES, TTS_VOICES};
