//! Template-driven generation
//!
//! Binds a template's form values to the adapter for its output kind and
//! records successful results in history.

use std::sync::Arc;

use crate::ai::{
    ElevenLabsClient, GeminiClient, ImageGenerator, ImageRequest, SpeechRequest,
    SpeechSynthesizer, TextGenerator,
};
use crate::catalog::{OutputKind, Template};
use crate::config::Config;
use crate::error::GenerationError;
use crate::history::HistoryStore;
use crate::input::GenerationInput;
use crate::prompt::{self, Unmatched};

#[derive(Clone)]
pub struct Generator {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    unmatched: Unmatched,
}

impl Generator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            text,
            image,
            speech,
            unmatched: Unmatched::default(),
        }
    }

    /// Build the real provider clients from configuration. Missing keys are
    /// not an error here; they surface per request.
    pub fn from_config(config: &Config) -> Self {
        let gemini_key = config.gemini_key();
        let gemini = Arc::new(
            GeminiClient::new(gemini_key.as_deref())
                .with_base_url(config.gemini_base_url())
                .with_models(config.text_model(), config.image_model()),
        );

        let eleven_key = config.eleven_labs_key();
        let speech = Arc::new(
            ElevenLabsClient::new(eleven_key.as_deref())
                .with_base_url(config.eleven_labs_base_url())
                .with_model(config.speech_model()),
        );

        if gemini_key.is_none() {
            tracing::warn!("API_KEY not set; text and image generation will fail");
        }
        if eleven_key.is_none() {
            tracing::warn!("ELEVEN_LABS_API_KEY not set; speech generation will fail");
        }

        Self::new(gemini.clone(), gemini, speech).with_unmatched(config.unmatched())
    }

    pub fn with_unmatched(mut self, unmatched: Unmatched) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn build_prompt(&self, template: &Template, input: &GenerationInput) -> String {
        prompt::render(template.prompt_pattern, input, self.unmatched)
    }

    /// Run one generation. Returns plain text or a `data:` URL.
    pub async fn generate(
        &self,
        template: &Template,
        input: &GenerationInput,
    ) -> Result<String, GenerationError> {
        input.validate(template)?;
        tracing::info!(template = template.id, output = template.output.as_str(), "generating");

        let result = match template.output {
            OutputKind::Image => {
                let request = ImageRequest {
                    prompt: input.value_or_empty("prompt").to_string(),
                    style: input.value_or_empty("style").to_string(),
                    aspect_ratio: input.value_or_empty("aspectRatio").to_string(),
                    text_overlay: input
                        .get("textOverlay")
                        .filter(|s| !s.trim().is_empty())
                        .map(str::to_string),
                };
                self.image.generate_image(&request).await
            }
            OutputKind::Audio => {
                let request = SpeechRequest {
                    text: input.value_or_empty("text").to_string(),
                    voice: input.value_or_empty("voiceId").to_string(),
                };
                self.speech.synthesize(&request).await
            }
            OutputKind::Text => {
                let prompt = self.build_prompt(template, input);
                self.text.generate_text(&prompt).await
            }
        };

        match &result {
            Ok(content) => tracing::info!(template = template.id, bytes = content.len(), "generation finished"),
            Err(e) => tracing::warn!(template = template.id, kind = e.kind(), "generation failed: {}", e),
        }
        result
    }

    /// Generate and, on success, append the result to `history`.
    ///
    /// A history write failure is logged but does not fail the generation.
    pub async fn generate_and_record(
        &self,
        template: &Template,
        input: &GenerationInput,
        history: &mut HistoryStore,
    ) -> Result<String, GenerationError> {
        let content = self.generate(template, input).await?;
        if let Err(e) = history.record(template, input, &content) {
            tracing::warn!("Failed to save history: {:#}", e);
        }
        Ok(content)
    }
}
