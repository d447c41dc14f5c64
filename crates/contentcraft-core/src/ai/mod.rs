pub mod elevenlabs;
pub mod gemini;

pub use elevenlabs::{voice_id_for, ElevenLabsClient};
pub use gemini::{compose_image_prompt, GeminiClient};

use async_trait::async_trait;

use crate::error::GenerationError;

/// Everything the image provider needs besides the credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: String,
    pub aspect_ratio: String,
    pub text_overlay: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    /// Human-readable voice label, mapped to a provider voice id
    pub voice: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Returns the image as a `data:` URL.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, GenerationError>;
}

/// Returns the audio as a `data:audio/...` URL.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<String, GenerationError>;
}
