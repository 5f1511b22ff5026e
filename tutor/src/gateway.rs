use std::sync::Arc;

use async_trait::async_trait;
use neurolearn_core::{GeminiClient, GeminiConfig, LearningStyle};
use tracing::warn;

use crate::errors::GatewayError;

type Result<T> = std::result::Result<T, GatewayError>;

/// The three remote generation calls a turn depends on.
///
/// `Ok(None)` means the call succeeded but produced nothing; `Err` is a failed call.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Lesson text for a question in a learning style
    async fn generate_text(&self, prompt: &str, style: LearningStyle) -> Result<Option<String>>;

    /// Base64 encoded illustration seeded by the learner's question
    async fn generate_image(&self, prompt_seed: &str) -> Result<Option<String>>;

    /// Raw PCM narration of a text
    async fn generate_audio(&self, source_text: &str) -> Result<Option<Vec<u8>>>;
}

/// Type alias for Arc-wrapped GenerationGateway trait objects
pub type GatewayRef = Arc<dyn GenerationGateway>;

/// Gateway backed by the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: Option<GeminiClient>,
}

impl GeminiGateway {
    /// Builds the gateway. Without a usable API key every call fails with
    /// [`GatewayError::Unavailable`].
    pub fn new(config: GeminiConfig) -> Self {
        let client = match GeminiClient::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Gemini client not initialized");
                None
            }
        };
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&GeminiClient> {
        self.client
            .as_ref()
            .ok_or_else(|| GatewayError::Unavailable("no Gemini API key configured".to_string()))
    }
}

#[async_trait]
impl GenerationGateway for GeminiGateway {
    async fn generate_text(&self, prompt: &str, style: LearningStyle) -> Result<Option<String>> {
        Ok(self.client()?.generate_lesson_content(prompt, style).await?)
    }

    async fn generate_image(&self, prompt_seed: &str) -> Result<Option<String>> {
        Ok(self.client()?.generate_lesson_visual(prompt_seed).await?)
    }

    async fn generate_audio(&self, source_text: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.client()?.generate_lesson_audio(source_text).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_gateway_fails_every_call() {
        let gateway = GeminiGateway::new(GeminiConfig::default());
        assert!(!gateway.is_configured());

        let text = gateway.generate_text("q", LearningStyle::Visual).await;
        assert!(matches!(text, Err(GatewayError::Unavailable(_))));
        assert!(gateway.generate_image("q").await.is_err());
        assert!(gateway.generate_audio("q").await.is_err());
    }

    #[test]
    fn test_configured_gateway() {
        let gateway = GeminiGateway::new(GeminiConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        });
        assert!(gateway.is_configured());
    }
}
