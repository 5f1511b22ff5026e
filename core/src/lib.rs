// Core Gemini API functionality for NeuroLearn:
// - API client for Gemini (text, image and speech generation)
// - Request/response data structures
// - Learning styles and their prompt instructions
// - Configuration loading
// - Shared error types

// Export client module - API client for Gemini
pub mod client;
pub use client::*;

// Export types module - Request/response data structures
pub mod types;
pub use types::*;

// Export style module - Learning styles and per-style instructions
pub mod style;
pub use style::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
