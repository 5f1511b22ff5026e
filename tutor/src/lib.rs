//! Conversation state and response orchestration for NeuroLearn.
//!
//! A turn appends the learner's message and a model placeholder to the
//! [`MessageStore`], asks the [`GenerationGateway`] for lesson text, then fans
//! out to image and speech generation and merges whatever succeeded back into
//! the same placeholder.

pub mod errors;
pub mod gateway;
pub mod message;
pub mod orchestrator;
pub mod settings;
pub mod store;

pub use errors::{GatewayError, TutorError};
pub use gateway::{GatewayRef, GeminiGateway, GenerationGateway};
pub use message::{ChatMessage, MessagePatch, MessageRole};
pub use orchestrator::{TurnHandle, TurnOutcome, TurnReport, Tutor, ERROR_TEXT, FALLBACK_TEXT};
pub use settings::{SettingsHandle, UserSettings};
pub use store::MessageStore;
