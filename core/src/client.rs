use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::{
    GeminiConfig, DEFAULT_AUDIO_MODEL, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
    DEFAULT_VOICE,
};
use crate::errors::{GeminiError, GeminiResult};
use crate::style::LearningStyle;
use crate::types::*;

/// Sample rate of the PCM returned by the speech models
pub const TTS_SAMPLE_RATE: u32 = 24_000;

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    audio_model: String,
    voice_name: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GeminiError::ConfigError(
                    "API key is required to initialize the Gemini client".to_string(),
                )
            })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            text_model: config
                .text_model
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: config
                .image_model
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            audio_model: config
                .audio_model
                .unwrap_or_else(|| DEFAULT_AUDIO_MODEL.to_string()),
            voice_name: config.voice_name.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            temperature: config.temperature,
        })
    }

    /// Get the endpoint URL for a model
    fn model_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        )
    }

    /// Generate content using the Gemini API
    #[instrument(skip(self, request))]
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.model_url(model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse response: {}", e)))?;

        if let Some(reason) = response_body
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            return Err(GeminiError::ApiError(format!("Prompt blocked: {}", reason)));
        }

        debug!(candidates = response_body.candidates.len(), "Received response");
        Ok(response_body)
    }

    /// Builds the lesson request for a question in the given learning style.
    pub(crate) fn create_lesson_request(
        &self,
        prompt: &str,
        style: LearningStyle,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: Some(Content::system(style.system_prompt())),
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn create_visual_request(&self, concept: &str) -> GenerateContentRequest {
        let prompt = format!(
            "Create a clear, educational diagram that explains the machine learning concept: {}. \
             Use a clean whiteboard style with labeled components and arrows showing flow. \
             Keep text in the image minimal.",
            concept
        );

        GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec![Modality::Text, Modality::Image]),
                ..Default::default()
            }),
        }
    }

    pub(crate) fn create_audio_request(&self, text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(format!(
                "Read this lesson aloud in a warm, clear teaching voice: {}",
                text
            ))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec![Modality::Audio]),
                speech_config: Some(SpeechConfig::prebuilt(self.voice_name.clone())),
                ..Default::default()
            }),
        }
    }

    /// Lesson text for a question. `Ok(None)` means the model answered with no text.
    pub async fn generate_lesson_content(
        &self,
        prompt: &str,
        style: LearningStyle,
    ) -> GeminiResult<Option<String>> {
        let request = self.create_lesson_request(prompt, style);
        let response = self.generate_content(&self.text_model, &request).await?;
        Ok(response.text())
    }

    /// Diagram for a concept, as the base64 payload of the first inline image.
    pub async fn generate_lesson_visual(&self, concept: &str) -> GeminiResult<Option<String>> {
        let request = self.create_visual_request(concept);
        let response = self.generate_content(&self.image_model, &request).await?;

        match response.inline_data() {
            Some(data) => Ok(Some(data.data.clone())),
            None => {
                warn!("Image model returned no inline image");
                Ok(None)
            }
        }
    }

    /// Spoken rendition of a text as raw 16-bit little-endian mono PCM.
    pub async fn generate_lesson_audio(&self, text: &str) -> GeminiResult<Option<Vec<u8>>> {
        let request = self.create_audio_request(text);
        let response = self.generate_content(&self.audio_model, &request).await?;

        match response.inline_data() {
            Some(data) => Ok(Some(BASE64.decode(data.data.as_bytes())?)),
            None => {
                warn!("Speech model returned no inline audio");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some("http://localhost:1234/".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = GeminiClient::new(GeminiConfig::default()).unwrap_err();
        assert!(matches!(err, GeminiError::ConfigError(_)));

        let blank = GeminiConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(GeminiClient::new(blank).is_err());
    }

    #[test]
    fn test_model_url_trims_trailing_slash() {
        assert_eq!(
            client().model_url("gemini-3-flash-preview"),
            "http://localhost:1234/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_lesson_request_carries_style_instruction() {
        let request = client().create_lesson_request("What is a perceptron?", LearningStyle::Theoretical);
        let system = request.system_instruction.unwrap();
        let text = system.parts[0].text.as_deref().unwrap();
        assert!(text.contains(LearningStyle::Theoretical.instruction()));
        assert_eq!(request.contents[0].parts[0].text.as_deref(), Some("What is a perceptron?"));
    }

    #[test]
    fn test_audio_request_asks_for_audio_modality() {
        let request = client().create_audio_request("Backpropagation computes gradients.");
        let config = request.generation_config.unwrap();
        assert_eq!(config.response_modalities, Some(vec![Modality::Audio]));
        assert!(config.speech_config.is_some());
    }
}
