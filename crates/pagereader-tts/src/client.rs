use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{TtsError, TtsResult};
use crate::input::build_input;
use crate::types::{tone_instruction, TtsSettings};

const TTS_API_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

/// Converts one section's text into audio bytes; stateless per call.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        title: Option<&str>,
        settings: &TtsSettings,
    ) -> TtsResult<Vec<u8>>;
}

/// OpenAI speech endpoint client.
pub struct OpenAiSynthesizer {
    http: reqwest::Client,
    endpoint: String,
}

impl Default for OpenAiSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiSynthesizer {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: TTS_API_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn build_payload(input: &str, settings: &TtsSettings) -> serde_json::Value {
        let mut payload = json!({
            "model": settings.model,
            "input": input,
            "voice": settings.voice,
            "response_format": "mp3",
            "instructions": tone_instruction(&settings.tone),
        });
        // Speed is only honored by the tts-1-1106 model.
        if settings.model == "tts-1-1106" {
            payload["speed"] = json!(settings.speed);
        }
        payload
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        title: Option<&str>,
        settings: &TtsSettings,
    ) -> TtsResult<Vec<u8>> {
        if !settings.has_api_key() {
            return Err(TtsError::Auth);
        }
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("empty section text".to_string()));
        }

        let input = build_input(title, text);
        let payload = Self::build_payload(&input, settings);
        debug!(
            chars = input.chars().count(),
            model = %settings.model,
            voice = %settings.voice,
            "requesting speech synthesis"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(settings.api_key.trim())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = parse_api_error(status.as_u16(), &body);
            warn!(status = status.as_u16(), "synthesis request failed");
            return Err(err);
        }

        let audio = response.bytes().await?.to_vec();
        debug!(bytes = audio.len(), "received audio data");
        Ok(audio)
    }
}

/// Map a non-success response to a `TtsError`, pulling `error.message` out of
/// the body when it parses.
fn parse_api_error(status: u16, body: &str) -> TtsError {
    if status == 401 || status == 403 {
        return TtsError::Auth;
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| format!("API error: {}", status));
    TtsError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_includes_speed_only_for_tts_1_1106() {
        let mut settings = TtsSettings {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        let payload = OpenAiSynthesizer::build_payload("hello", &settings);
        assert!(payload.get("speed").is_none());
        assert_eq!(payload["response_format"], "mp3");
        assert_eq!(
            payload["instructions"],
            "Speak in a natural, conversational tone."
        );

        settings.model = "tts-1-1106".into();
        settings.speed = 1.25;
        let payload = OpenAiSynthesizer::build_payload("hello", &settings);
        assert_eq!(payload["speed"], 1.25);
    }

    #[test]
    fn error_body_message_extracted() {
        let body = r#"{"error":{"message":"rate limited","type":"requests"}}"#;
        match parse_api_error(429, body) {
            TtsError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_falls_back_to_status() {
        match parse_api_error(500, "<html>boom</html>") {
            TtsError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "API error: 500");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn auth_status_maps_to_auth_error() {
        assert!(matches!(parse_api_error(401, ""), TtsError::Auth));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = OpenAiSynthesizer::with_endpoint("http://127.0.0.1:1/never");
        let settings = TtsSettings::default();
        let err = client
            .synthesize("hello", None, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Auth));
    }
}
