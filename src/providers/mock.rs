//! Offline provider answering from the catalog's canned results

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ProviderError, VisionProvider};
use crate::capture::ImagePayload;
use crate::catalog::{self, AIPreset, MarketSession};
use crate::models::RawModelReply;

/// Cycles through the canned results, one per call, so repeated runs show
/// different answers without a random source.
#[derive(Debug, Default)]
pub struct MockProvider {
    cursor: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn analyze(
        &self,
        _image: &ImagePayload,
        _preset: Option<&AIPreset>,
    ) -> Result<RawModelReply, ProviderError> {
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        let results = catalog::mock_results();
        let assets = catalog::instruments(MarketSession::Open);
        let result = &results[turn % results.len()];

        let reply = json!({
            "asset": assets[turn % assets.len()],
            "direction": result.direction,
            "confidence": result.confidence,
            "reasoning": result.reasoning,
            "pattern": result.pattern,
        });
        Ok(RawModelReply::new(reply.to_string()))
    }
}
