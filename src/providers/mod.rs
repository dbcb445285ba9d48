//! Hosted multimodal providers behind one dispatch seam.
//!
//! Every provider takes the encoded chart plus an optional preset and hands
//! back the model's raw text. Reading that text is the normalizer's job.

pub mod endpoint;
pub mod gemini;
pub mod mock;
pub mod openrouter;
pub mod prompt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::capture::ImagePayload;
use crate::catalog::AIPreset;
use crate::models::RawModelReply;

pub use endpoint::EndpointProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openrouter::OpenRouterProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Operator-facing; retrying cannot help until the key is configured.
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: &'static str },
    #[error("{provider} returned HTTP {status}")]
    Upstream {
        provider: &'static str,
        status: u16,
        details: Value,
    },
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned an unreadable response: {reason}")]
    Envelope {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::MissingApiKey { provider }
            | ProviderError::Upstream { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Envelope { provider, .. } => provider,
        }
    }
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Short label used in logs, metrics and diagnostic reasoning.
    fn name(&self) -> &'static str;

    /// One attempt, no retry, no timeout.
    async fn analyze(
        &self,
        image: &ImagePayload,
        preset: Option<&AIPreset>,
    ) -> Result<RawModelReply, ProviderError>;
}

/// Parse an error body for the `details` field, keeping plain text as a
/// JSON string when the provider did not answer in JSON.
pub(crate) fn error_details(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
