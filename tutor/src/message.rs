use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const WELCOME_ID: &str = "welcome";

const WELCOME_TEXT: &str = "**Welcome to NeuroLearn!** \n\n\
I'm your AI tutor specialized in Machine Learning. I can explain concepts visually, \
auditory, mathematically, or with code.\n\n\
Try asking: *\"How does Gradient Descent work?\"*";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// One entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_loading: bool,
    /// Base64 encoded image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_image: Option<String>,
    /// Raw 16-bit PCM
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_audio: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
}

impl ChatMessage {
    fn new(role: MessageRole, text: String, is_loading: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text,
            timestamp: Utc::now(),
            is_loading,
            related_image: None,
            related_audio: None,
            code_snippet: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text.into(), false)
    }

    /// Empty model message awaiting generation
    pub fn placeholder() -> Self {
        Self::new(MessageRole::Model, String::new(), true)
    }

    /// Greeting shown at the start of every session
    pub fn welcome() -> Self {
        Self {
            id: WELCOME_ID.to_string(),
            ..Self::new(MessageRole::Model, WELCOME_TEXT.to_string(), false)
        }
    }

    /// Applies every field present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: MessagePatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(is_loading) = patch.is_loading {
            self.is_loading = is_loading;
        }
        if let Some(image) = patch.related_image {
            self.related_image = Some(image);
        }
        if let Some(audio) = patch.related_audio {
            self.related_audio = Some(audio);
        }
    }
}

/// Field-level update for a stored message. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub is_loading: Option<bool>,
    pub related_image: Option<String>,
    pub related_audio: Option<Vec<u8>>,
}

impl MessagePatch {
    /// Final text for a message whose generation has finished
    pub fn finished(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_loading: Some(false),
            ..Default::default()
        }
    }

    pub fn assets(image: Option<String>, audio: Option<Vec<u8>>) -> Self {
        Self {
            related_image: image,
            related_audio: audio,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
