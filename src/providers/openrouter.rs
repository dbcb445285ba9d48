//! OpenRouter chat-completions provider (GPT-4o by default)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use super::{error_details, prompt, ProviderError, VisionProvider};
use crate::capture::ImagePayload;
use crate::catalog::AIPreset;
use crate::config::ProviderSettings;
use crate::models::RawModelReply;

const NAME: &str = "OpenRouter";

#[derive(Debug, Default, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenRouterProvider {
    settings: ProviderSettings,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    pub fn with_client(settings: ProviderSettings, client: reqwest::Client) -> Self {
        Self { settings, client }
    }
}

#[async_trait]
impl VisionProvider for OpenRouterProvider {
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

        let body = json!({
            "model": self.settings.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt::english(preset) },
                    { "type": "image_url", "image_url": { "url": image.data_url() } },
                ],
            }],
        });

        let transport = |source| ProviderError::Transport {
            provider: NAME,
            source,
        };
        let response = self
            .client
            .post(format!("{}/api/v1/chat/completions", self.settings.base()))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            error!(status = status.as_u16(), "OpenRouter API error");
            return Err(ProviderError::Upstream {
                provider: NAME,
                status: status.as_u16(),
                details: error_details(&text),
            });
        }

        let completion: ChatCompletion =
            serde_json::from_str(&text).map_err(|e| ProviderError::Envelope {
                provider: NAME,
                reason: e.to_string(),
            })?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        debug!(chars = reply.chars().count(), "Raw OpenRouter reply received");
        Ok(RawModelReply::new(reply))
    }
}
