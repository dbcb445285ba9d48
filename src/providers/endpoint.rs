//! Dispatch through one of the request-forwarding endpoints.
//!
//! This is the browser-side path: the front-end never holds provider keys,
//! it posts the data URL to a forwarding endpoint and reads back the JSON
//! verdict. The body is handed to the normalizer like any other reply.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use super::{error_details, ProviderError, VisionProvider};
use crate::capture::ImagePayload;
use crate::catalog::AIPreset;
use crate::models::RawModelReply;

const NAME: &str = "endpoint";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForwardRequest<'a> {
    image_url: &'a str,
    #[serde(rename = "selectedAI", skip_serializing_if = "Option::is_none")]
    selected_ai: Option<&'a str>,
}

pub struct EndpointProvider {
    url: Url,
    client: reqwest::Client,
}

impl EndpointProvider {
    pub fn new(url: Url) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: Url, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl VisionProvider for EndpointProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(
        &self,
        image: &ImagePayload,
        preset: Option<&AIPreset>,
    ) -> Result<RawModelReply, ProviderError> {
        let body = ForwardRequest {
            image_url: image.data_url(),
            selected_ai: preset.map(|preset| preset.id),
        };
        info!(url = %self.url, preset = ?body.selected_ai, "Forwarding analysis request");

        let transport = |source| ProviderError::Transport {
            provider: NAME,
            source,
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        if !status.is_success() {
            error!(status = status.as_u16(), url = %self.url, "Forwarding endpoint error");
            return Err(ProviderError::Upstream {
                provider: NAME,
                status: status.as_u16(),
                details: error_details(&text),
            });
        }

        Ok(RawModelReply::new(text))
    }
}
