//! Google Generative AI (Gemini) vision provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{error_details, prompt, ProviderError, VisionProvider};
use crate::capture::ImagePayload;
use crate::catalog::AIPreset;
use crate::config::ProviderSettings;
use crate::models::RawModelReply;

const NAME: &str = "Gemini";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: String },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined. Empty when the model
    /// answered nothing usable.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

pub struct GeminiProvider {
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    pub fn with_client(settings: ProviderSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base(),
            self.settings.model
        )
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(
        &self,
        image: &ImagePayload,
        preset: Option<&AIPreset>,
    ) -> Result<RawModelReply, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey { provider: NAME })?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt::portuguese(preset),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type(),
                            data: image.base64_data(),
                        },
                    },
                ],
            }],
        };

        let transport = |source| ProviderError::Transport {
            provider: NAME,
            source,
        };
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            error!(status = status.as_u16(), "Gemini API error");
            return Err(ProviderError::Upstream {
                provider: NAME,
                status: status.as_u16(),
                details: error_details(&text),
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Envelope {
                provider: NAME,
                reason: e.to_string(),
            })?;
        let reply = parsed.into_text();
        debug!(chars = reply.chars().count(), "Raw Gemini reply received");
        Ok(RawModelReply::new(reply))
    }
}
