use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ImageGenerator, ImageRequest, TextGenerator};
use crate::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::error::GenerationError;

pub const NO_CONTENT_FALLBACK: &str = "No content generated.";

const MISSING_KEY: &str =
    "Gemini API key missing. Set API_KEY in the environment or gemini_api_key in config.json.";

/// Aspect ratio to composition phrase appended to image prompts
const ASPECT_COMPOSITIONS: &[(&str, &str)] = &[
    ("1:1", "square composition"),
    ("16:9", "wide landscape composition"),
    ("9:16", "tall portrait composition"),
    ("4:3", "standard landscape composition"),
    ("3:4", "standard portrait composition"),
];

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
    status: Option<String>,
}

/// Why a `generateContent` call failed.
#[derive(Debug)]
enum CallError {
    /// The request never produced a usable response (connect, TLS, decode)
    Transport(String),
    /// Gemini answered with a non-success status; carries its error message
    Upstream(String),
}

impl CallError {
    fn message(&self) -> &str {
        match self {
            CallError::Transport(m) | CallError::Upstream(m) => m,
        }
    }
}

/// Client for Gemini text and image generation.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.map(str::to_string),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, text_model: &str, image_model: &str) -> Self {
        self.text_model = text_model.to_string();
        self.image_model = image_model.to_string();
        self
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::Configuration(MISSING_KEY.to_string()))
    }

    /// Send one `generateContent` call. Upstream errors carry Gemini's own
    /// message so callers can refine them.
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<GeminiResponse, CallError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CallError::Upstream(upstream_message(status.as_u16(), &text)));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        tracing::info!(model = %self.text_model, "requesting text generation");

        let response = self
            .generate_content(api_key, &self.text_model, prompt)
            .await
            .map_err(|e| {
                tracing::error!("Gemini API error: {:?}", e);
                GenerationError::Provider(format!("Gemini API error: {}", e.message()))
            })?;

        Ok(extract_text(&response).unwrap_or_else(|| NO_CONTENT_FALLBACK.to_string()))
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let prompt = compose_image_prompt(
            &request.prompt,
            &request.style,
            &request.aspect_ratio,
            request.text_overlay.as_deref(),
        );
        tracing::info!(model = %self.image_model, "requesting image generation");
        tracing::debug!(prompt = %prompt, "image prompt");

        let response = self
            .generate_content(api_key, &self.image_model, &prompt)
            .await
            .map_err(|e| {
                tracing::error!("Gemini image generation error: {:?}", e);
                GenerationError::Provider(match e {
                    CallError::Upstream(message) => refine_image_error(&message),
                    CallError::Transport(message) => {
                        format!("Image generation failed: {}", message)
                    }
                })
            })?;

        extract_image(&response)
    }
}

/// Build the final image prompt from the form values.
pub fn compose_image_prompt(
    prompt: &str,
    style: &str,
    aspect_ratio: &str,
    text_overlay: Option<&str>,
) -> String {
    let mut final_prompt = format!(
        "{}. Art Style: {}. High quality, detailed, professional.",
        prompt, style
    );

    if let Some(overlay) = text_overlay.filter(|o| !o.trim().is_empty()) {
        final_prompt.push_str(&format!(" Include text overlay: \"{}\"", overlay));
    }

    if let Some(composition) = composition_for(aspect_ratio) {
        final_prompt.push_str(&format!(" {}.", composition));
    }

    final_prompt
}

/// Composition phrase for a ratio such as `16:9` or a catalog label such as
/// `16:9 (Landscape)`.
///
/// Only the leading ratio token is compared, so the labelled options the
/// image form offers get a phrase too. A lookup on the full label string
/// would never match them.
pub fn composition_for(aspect_ratio: &str) -> Option<&'static str> {
    let ratio = aspect_ratio.split_whitespace().next()?;
    ASPECT_COMPOSITIONS
        .iter()
        .find(|(r, _)| *r == ratio)
        .map(|(_, phrase)| *phrase)
}

fn upstream_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{}: {}", code, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

fn extract_text(response: &GeminiResponse) -> Option<String> {
    let parts = &response.candidates.first()?.content.as_ref()?.parts;
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_image(response: &GeminiResponse) -> Result<String, GenerationError> {
    let candidate = response.candidates.first().ok_or_else(|| {
        GenerationError::NoImage("Image generation failed: No image generated from Gemini API".to_string())
    })?;

    candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .find_map(|part| part.inline_data.as_ref())
        .map(|inline| format!("data:{};base64,{}", inline.mime_type, inline.data))
        .ok_or_else(|| {
            GenerationError::NoImage(
                "Image generation failed: No image data found in Gemini response".to_string(),
            )
        })
}

/// Turn common upstream failures into actionable messages. Only applied to
/// Gemini's own error messages, never to transport errors.
fn refine_image_error(message: &str) -> String {
    let lower = message.to_lowercase();
    if lower.contains("api key") {
        "Invalid or missing Gemini API key. Please check API_KEY in your environment.".to_string()
    } else if lower.contains("quota") {
        "API quota exceeded. Please check your Gemini API usage limits.".to_string()
    } else if lower.contains("model") || message.contains("NOT_FOUND") {
        "Model not available. Ensure the image model is accessible with your API key.".to_string()
    } else {
        format!("Image generation failed: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub;

    fn parse(json: &str) -> GeminiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_compose_wide_landscape() {
        let prompt = compose_image_prompt("A city", "Anime", "16:9", None);
        assert_eq!(
            prompt,
            "A city. Art Style: Anime. High quality, detailed, professional. wide landscape composition."
        );
    }

    #[test]
    fn test_compose_accepts_catalog_labels_and_overlay() {
        let prompt = compose_image_prompt("Beach", "Minimalist", "9:16 (Portrait)", Some("Summer Sale"));
        assert!(prompt.contains(" Include text overlay: \"Summer Sale\""));
        assert!(prompt.ends_with("tall portrait composition."));
    }

    #[test]
    fn test_compose_unknown_ratio_adds_nothing() {
        let prompt = compose_image_prompt("Beach", "Anime", "21:9", Some(""));
        assert_eq!(prompt, "Beach. Art Style: Anime. High quality, detailed, professional.");
        assert!(!prompt.contains("composition"));
        assert!(!prompt.contains("overlay"));
    }

    #[test]
    fn test_extract_text_joins_parts_and_falls_back() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}]}"#,
        );
        assert_eq!(extract_text(&response).as_deref(), Some("Hello, world"));

        assert_eq!(extract_text(&parse(r#"{"candidates":[]}"#)), None);
        assert_eq!(extract_text(&parse(r#"{}"#)), None);
    }

    #[test]
    fn test_extract_image_finds_inline_data() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here is your image"},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
            ]}}]}"#,
        );
        assert_eq!(
            extract_image(&response).unwrap(),
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[test]
    fn test_extract_image_errors() {
        let none = extract_image(&parse(r#"{"candidates":[]}"#)).unwrap_err();
        assert_eq!(none.kind(), "no_image");

        let text_only = parse(r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#);
        let err = extract_image(&text_only).unwrap_err();
        assert!(matches!(err, GenerationError::NoImage(_)));
        assert!(err.to_string().contains("No image data found"));
    }

    #[test]
    fn test_upstream_message_prefers_error_envelope() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            upstream_message(429, body),
            "RESOURCE_EXHAUSTED: Resource has been exhausted (e.g. check quota)."
        );
        assert_eq!(upstream_message(502, ""), "HTTP 502");
        assert_eq!(upstream_message(500, "oops"), "HTTP 500: oops");
    }

    #[test]
    fn test_refine_image_error() {
        assert!(refine_image_error("INVALID_ARGUMENT: API key not valid.").starts_with("Invalid or missing"));
        assert!(refine_image_error("RESOURCE_EXHAUSTED: check quota").starts_with("API quota"));
        assert!(refine_image_error("NOT_FOUND: models/x is not found").starts_with("Model not available"));
        assert_eq!(
            refine_image_error("connection reset"),
            "Image generation failed: connection reset"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        // Unroutable base URL: reaching the network would surface a Provider error instead.
        let client = GeminiClient::new(None).with_base_url("http://127.0.0.1:9");
        let err = client.generate_text("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));

        let blank = GeminiClient::new(Some("  ")).with_base_url("http://127.0.0.1:9");
        let err = blank
            .generate_image(&ImageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    fn keyed(base_url: &str) -> GeminiClient {
        GeminiClient::new(Some("test-key")).with_base_url(base_url)
    }

    fn image_request() -> ImageRequest {
        ImageRequest {
            prompt: "A lighthouse".to_string(),
            style: "Photorealistic".to_string(),
            aspect_ratio: "1:1 (Square)".to_string(),
            text_overlay: None,
        }
    }

    #[tokio::test]
    async fn test_text_success_over_http() {
        let (url, request) = stub::serve_once(
            "200 OK",
            "application/json",
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello from Gemini"}]}}]}"#,
        )
        .await;

        let text = keyed(&url).generate_text("Say hello").await.unwrap();
        assert_eq!(text, "Hello from Gemini");

        let request = request.await.unwrap();
        assert!(request.starts_with("post /v1beta/models/gemini-2.5-flash:generatecontent"));
        assert!(request.contains("x-goog-api-key: test-key"));
        assert!(request.contains(r#""text":"say hello""#));
    }

    #[tokio::test]
    async fn test_text_empty_candidates_falls_back() {
        let (url, _) = stub::serve_once("200 OK", "application/json", r#"{"candidates":[]}"#).await;
        let text = keyed(&url).generate_text("anything").await.unwrap();
        assert_eq!(text, NO_CONTENT_FALLBACK);
    }

    #[tokio::test]
    async fn test_text_upstream_error_is_provider_error() {
        let (url, _) = stub::serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
        )
        .await;

        let err = keyed(&url).generate_text("anything").await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Provider("Gemini API error: INVALID_ARGUMENT: API key not valid.".to_string())
        );
    }

    #[tokio::test]
    async fn test_image_success_over_http() {
        let (url, request) = stub::serve_once(
            "200 OK",
            "application/json",
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}]}}]}"#,
        )
        .await;

        let image = keyed(&url).generate_image(&image_request()).await.unwrap();
        assert_eq!(image, "data:image/png;base64,iVBORw0KGgo=");

        let request = request.await.unwrap();
        assert!(request.starts_with("post /v1beta/models/gemini-2.5-flash-image:generatecontent"));
        assert!(request.contains("square composition."));
    }

    #[tokio::test]
    async fn test_image_text_only_response_is_no_image() {
        let (url, _) = stub::serve_once(
            "200 OK",
            "application/json",
            r#"{"candidates":[{"content":{"parts":[{"text":"I can't draw that"}]}}]}"#,
        )
        .await;

        let err = keyed(&url).generate_image(&image_request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoImage(_)));
    }

    #[tokio::test]
    async fn test_image_upstream_not_found_is_refined() {
        let (url, _) = stub::serve_once(
            "404 Not Found",
            "application/json",
            r#"{"error":{"code":404,"message":"models/x is not found","status":"NOT_FOUND"}}"#,
        )
        .await;

        let err = keyed(&url).generate_image(&image_request()).await.unwrap_err();
        assert!(err.to_string().starts_with("Model not available"));
    }

    #[tokio::test]
    async fn test_image_connection_failure_is_reported_as_is() {
        // Nothing listens on the discard port; the URL still mentions /models/
        let err = keyed("http://127.0.0.1:9")
            .generate_image(&image_request())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Provider(_)));
        let message = err.to_string();
        assert!(message.starts_with("Image generation failed: "), "{}", message);
        assert!(!message.contains("Model not available"));
    }

    #[tokio::test]
    async fn test_text_connection_failure_is_provider_error() {
        let err = keyed("http://127.0.0.1:9").generate_text("hi").await.unwrap_err();
        assert!(err.to_string().starts_with("Gemini API error: "));
    }

}
