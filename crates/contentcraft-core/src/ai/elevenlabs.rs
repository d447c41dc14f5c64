use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{SpeechRequest, SpeechSynthesizer};
use crate::config::{DEFAULT_ELEVEN_LABS_BASE_URL, DEFAULT_SPEECH_MODEL};
use crate::content::data_url;
use crate::error::GenerationError;

/// Voice label (as shown in the form) to ElevenLabs voice id.
/// The first entry is the fallback for unknown labels.
pub const VOICES: &[(&str, &str)] = &[
    ("Rachel (American, Calm)", "21m00Tcm4TlvDq8ikWAM"),
    ("Domi (American, Strong)", "AZnzlk1XvdvUeBnXmlld"),
    ("Bella (American, Soft)", "EXAVITQu4vr4xnSDxMaL"),
    ("Antoni (American, Well-rounded)", "ErXwobaYiN019PkySvjV"),
    ("Josh (American, Deep)", "TxGEqnHWrfWFTfGW9XjX"),
];

pub fn voice_id_for(label: &str) -> &'static str {
    VOICES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, id)| *id)
        .unwrap_or(VOICES[0].1)
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Serialize)]
struct SpeechBody {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.map(str::to_string),
            base_url: DEFAULT_ELEVEN_LABS_BASE_URL.to_string(),
            model: DEFAULT_SPEECH_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Configuration(
                    "ElevenLabs API Key missing in environment variables (ELEVEN_LABS_API_KEY)"
                        .to_string(),
                )
            })?;

        let voice_id = voice_id_for(&request.voice);
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);

        let body = SpeechBody {
            text: request.text.clone(),
            model_id: self.model.clone(),
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };

        tracing::info!(voice_id, "requesting speech synthesis");

        let response = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .header("Content-Type", "application/json")
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!("ElevenLabs API error {}: {}", status, text);
            return Err(GenerationError::Provider(
                "Failed to generate speech. Please check your API Key and Quota.".to_string(),
            ));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(GenerationError::NoContent(
                "Speech generation returned no audio.".to_string(),
            ));
        }

        Ok(data_url("audio/mpeg", &audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub;

    #[test]
    fn test_known_voice_labels_map_to_ids() {
        assert_eq!(voice_id_for("Josh (American, Deep)"), "TxGEqnHWrfWFTfGW9XjX");
        assert_eq!(voice_id_for("Bella (American, Soft)"), "EXAVITQu4vr4xnSDxMaL");
    }

    #[test]
    fn test_unknown_voice_falls_back_to_default() {
        assert_eq!(voice_id_for("Morgan (British)"), "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(voice_id_for(""), "21m00Tcm4TlvDq8ikWAM");
    }

    #[test]
    fn test_voice_map_covers_catalog_options() {
        for label in crate::catalog::VOICE_OPTIONS {
            assert!(VOICES.iter().any(|(name, _)| name == label), "{}", label);
        }
    }

    #[test]
    fn test_body_shape() {
        let body = SpeechBody {
            text: "Hello".to_string(),
            model_id: DEFAULT_SPEECH_MODEL.to_string(),
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.5,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model_id"], "eleven_monolingual_v1");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = ElevenLabsClient::new(None).with_base_url("http://127.0.0.1:9");
        let err = client
            .synthesize(&SpeechRequest {
                text: "Hello".to_string(),
                voice: "Nobody".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
        assert!(err.to_string().contains("ELEVEN_LABS_API_KEY"));
    }

    fn josh() -> SpeechRequest {
        SpeechRequest {
            text: "Hello there".to_string(),
            voice: "Josh (American, Deep)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_audio_success_over_http() {
        let (url, request) = stub::serve_once("200 OK", "audio/mpeg", vec![1u8, 2, 3]).await;

        let audio = ElevenLabsClient::new(Some("xi-test"))
            .with_base_url(&url)
            .synthesize(&josh())
            .await
            .unwrap();
        assert_eq!(audio, "data:audio/mpeg;base64,AQID");

        let request = request.await.unwrap();
        assert!(request.starts_with("post /v1/text-to-speech/txgeqnhwrfwftfgw9xjx"));
        assert!(request.contains("xi-api-key: xi-test"));
        assert!(request.contains(r#""model_id":"eleven_monolingual_v1""#));
    }

    #[tokio::test]
    async fn test_rejected_request_has_fixed_message() {
        let (url, _) = stub::serve_once(
            "401 Unauthorized",
            "application/json",
            r#"{"detail":{"status":"invalid_api_key"}}"#,
        )
        .await;

        let err = ElevenLabsClient::new(Some("xi-test"))
            .with_base_url(&url)
            .synthesize(&josh())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Provider(
                "Failed to generate speech. Please check your API Key and Quota.".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_empty_audio_is_no_content() {
        let (url, _) = stub::serve_once("200 OK", "audio/mpeg", Vec::new()).await;

        let err = ElevenLabsClient::new(Some("xi-test"))
            .with_base_url(&url)
            .synthesize(&josh())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoContent(_)));
    }

}
