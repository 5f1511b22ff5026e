use neurolearn_core::GeminiError;
use thiserror::Error;

/// Failure of a single remote generation call
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("Generation unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a new turn is refused before anything is appended
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TutorError {
    #[error("A response is still being generated")]
    Busy,

    #[error("Cannot send an empty message")]
    EmptyUtterance,
}
