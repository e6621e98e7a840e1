use serde::{Deserialize, Serialize};

/// User-facing TTS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub api_key: String,
    pub voice: String,
    pub model: String,
    pub tone: String,
    pub speed: f32,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            // Default to the more expressive voice and the latest model.
            voice: "coral".to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            tone: "natural".to_string(),
            speed: 1.0,
        }
    }
}

impl TtsSettings {
    /// Force an unrecognized model back to the default.
    pub fn normalize(mut self) -> Self {
        if !TTS_MODELS.iter().any(|(id, _)| *id == self.model) {
            self.model = TtsSettings::default().model;
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Supported models, latest only.
pub const TTS_MODELS: &[(&str, &str)] = &[
    ("gpt-4o-mini-tts", "GPT-4o Mini TTS (Latest)"),
    ("tts-1-1106", "TTS 1106 (Latest)"),
];

/// Available voices.
pub const TTS_VOICES: &[(&str, &str)] = &[
    ("alloy", "Alloy (Neutral)"),
    ("echo", "Echo (Male)"),
    ("fable", "Fable (British)"),
    ("onyx", "Onyx (Male)"),
    ("nova", "Nova (Female)"),
    ("shimmer", "Shimmer (Female)"),
    ("coral", "Coral (Expressive)"),
];

/// Tone presets mapped to instruction strings for the model.
pub const TTS_TONES: &[(&str, &str)] = &[
    ("natural", "Speak in a natural, conversational tone."),
    ("cheerful", "Speak in a cheerful and positive tone."),
    ("formal", "Speak in a formal and professional tone."),
    ("serious", "Speak in a serious and direct tone."),
    ("excited", "Speak with enthusiasm and excitement."),
];

/// Instruction string for a tone id, falling back to `natural`.
pub fn tone_instruction(tone: &str) -> &'static str {
    TTS_TONES
        .iter()
        .find(|(id, _)| *id == tone)
        .or_else(|| TTS_TONES.iter().find(|(id, _)| *id == "natural"))
        .map(|(_, instruction)| *instruction)
        .unwrap_or("Speak in a natural, conversational tone.")
}
