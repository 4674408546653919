//! ElevenLabs text-to-speech client.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::IntegrationError;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "9BWtsMINqrJLrRacOk9x";
/// Display name of the default voice, stored with each audio row.
pub const DEFAULT_VOICE_NAME: &str = "Aria";
const MODEL_ID: &str = "eleven_turbo_v2_5";
/// Longest script sent in one synthesis request.
pub const MAX_SCRIPT_CHARS: usize = 5000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error-body markers ElevenLabs uses when it refuses work for account
/// reasons rather than request reasons.
const REFUSAL_MARKERS: &[(&str, &str)] = &[
    ("detected_unusual_activity", "unusual activity"),
    ("quota_exceeded", "quota exceeded"),
    ("too_many_concurrent_requests", "too many concurrent requests"),
    ("system_busy", "system busy"),
];

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Clone)]
pub struct TtsClient {
    client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
}

impl TtsClient {
    pub fn new(api_key: String, base_url: &str, voice_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            voice_id,
        }
    }

    /// Name recorded as `voice_used` on stored audio rows.
    pub fn voice_label(&self) -> &str {
        if self.voice_id == DEFAULT_VOICE_ID {
            DEFAULT_VOICE_NAME
        } else {
            &self.voice_id
        }
    }

    /// Synthesizes `script` (truncated to [`MAX_SCRIPT_CHARS`]) to MP3 bytes.
    pub async fn synthesize(&self, script: &str) -> Result<Bytes, IntegrationError> {
        let text = truncate_chars(script, MAX_SCRIPT_CHARS);
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .timeout(REQUEST_TIMEOUT)
            .json(&TtsRequest {
                text,
                model_id: MODEL_ID,
                voice_settings: VoiceSettings {
                    stability: 0.5,
                    similarity_boost: 0.75,
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if let Some(reason) = refusal_reason(&message) {
                return Err(IntegrationError::Refused {
                    service: "elevenlabs",
                    reason,
                    message,
                });
            }
            return Err(IntegrationError::Api {
                service: "elevenlabs",
                status: status.as_u16(),
                message,
            });
        }

        let audio = response.bytes().await?;
        debug!(bytes = audio.len(), "ElevenLabs synthesis complete");
        Ok(audio)
    }
}

fn refusal_reason(body: &str) -> Option<&'static str> {
    REFUSAL_MARKERS
        .iter()
        .find(|(marker, _)| body.contains(marker))
        .map(|(_, reason)| *reason)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn test_voice_label() {
        let default = TtsClient::new("xi".to_string(), DEFAULT_BASE_URL, DEFAULT_VOICE_ID.to_string());
        assert_eq!(default.voice_label(), "Aria");
        let custom = TtsClient::new("xi".to_string(), DEFAULT_BASE_URL, "custom".to_string());
        assert_eq!(custom.voice_label(), "custom");
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/text-to-speech/{DEFAULT_VOICE_ID}")))
            .and(header("xi-api-key", "xi"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let tts = TtsClient::new("xi".to_string(), &server.uri(), DEFAULT_VOICE_ID.to_string());
        let audio = tts.synthesize("hello").await.unwrap();
        assert_eq!(audio.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_abuse_detection_is_reported_as_refusal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"detail":{"status":"detected_unusual_activity","message":"Unusual activity detected"}}"#,
            ))
            .mount(&server)
            .await;

        let tts = TtsClient::new("xi".to_string(), &server.uri(), DEFAULT_VOICE_ID.to_string());
        let err = tts.synthesize("hello").await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Refused {
                reason: "unusual activity",
                ..
            }
        ));
    }
}
