//! Client side of the hosted Gemini model.
//!
//! Every feature of the service talks to the model through the
//! [`ContentGenerator`] trait so handlers can be driven by a canned
//! implementation in tests.

mod client;
mod rate_limit;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::GeminiClient;
pub use rate_limit::RequestRateLimiter;
pub use types::{
    Blob, Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    MultiSpeakerVoiceConfig, Part, PrebuiltVoiceConfig, PromptFeedback, SpeakerVoiceConfig,
    SpeechConfig, VoiceConfig,
};

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Content filtered by Gemini safety settings ({0})")]
    Blocked(String),

    #[error("Empty response from Gemini API")]
    EmptyResponse,

    #[error("Gemini response contained no audio data")]
    MissingAudio,

    #[error("invalid inline data in Gemini response: {0}")]
    InvalidInlineData(#[from] base64::DecodeError),
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError>;
}
