//! Analysis request dispatch

use chrono::{DateTime, FixedOffset, Local};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::metrics::Metrics;
use crate::models::{AnalysisRequest, AnalysisResult, ValidationError};
use crate::normalizer;
use crate::providers::{ProviderError, VisionProvider};

/// Shown for any provider-side failure; the user simply tries again.
pub const RETRY_MESSAGE: &str = "Erro ao analisar a imagem. Tente novamente.";
pub const NOT_CONFIGURED_MESSAGE: &str =
    "O serviço de análise não está configurado. Contate o administrador.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AnalysisError {
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Validation(e) => e.to_string(),
            AnalysisError::Provider(ProviderError::MissingApiKey { .. }) => {
                NOT_CONFIGURED_MESSAGE.to_string()
            }
            AnalysisError::Provider(_) => RETRY_MESSAGE.to_string(),
        }
    }
}

/// Metric label for a failed provider call.
pub fn outcome_label(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::MissingApiKey { .. } => "config",
        ProviderError::Upstream { .. } => "upstream",
        ProviderError::Transport { .. } | ProviderError::Envelope { .. } => "transport",
    }
}

/// Validates a request, dispatches it once and normalizes the reply.
///
/// Transport and upstream failures abort with an error. Only an unreadable
/// reply body is degraded into a default result.
pub struct AnalysisService {
    provider: Arc<dyn VisionProvider>,
    metrics: Option<Arc<Metrics>>,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self {
            provider,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.run_at(request, Local::now().fixed_offset()).await
    }

    pub async fn run_at(
        &self,
        request: &AnalysisRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let provider = self.provider.name();

        if let Err(e) = request.validate() {
            warn!(provider = provider, error = %e, "Rejected analysis request");
            self.record(provider, "invalid");
            return Err(e.into());
        }

        info!(
            provider = provider,
            mode = ?request.mode,
            timeframe = %request.timeframe,
            image = %request.image,
            "Dispatching chart analysis"
        );

        let reply = match self.provider.analyze(&request.image, request.preset()).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(provider = provider, error = %e, "Chart analysis failed");
                self.record(provider, outcome_label(&e));
                return Err(e.into());
            }
        };

        let resolved = normalizer::resolve_verdict(&reply, provider);
        if resolved.diagnostic.is_some() {
            if let Some(metrics) = &self.metrics {
                metrics.record_parse_failure(provider);
            }
        }
        self.record(provider, "ok");

        let result = normalizer::apply_request(resolved.verdict, request, now);
        info!(
            provider = provider,
            instrument = %result.instrument,
            direction = %result.direction,
            confidence = result.confidence,
            "Chart analysis complete"
        );
        Ok(result)
    }

    fn record(&self, provider: &str, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_analysis(provider, outcome);
        }
    }
}
