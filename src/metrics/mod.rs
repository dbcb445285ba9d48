//! Prometheus metrics for the HTTP surface and the analysis flow

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    /// Labels: provider, outcome (`ok`, `invalid`, `config`, `upstream`, `transport`).
    pub analysis_requests_total: IntCounterVec,
    /// Replies that degraded into a default verdict. Label: provider.
    pub reply_parse_failures_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;
        let analysis_requests_total = IntCounterVec::new(
            Opts::new(
                "analysis_requests_total",
                "Chart analyses by provider and outcome",
            ),
            &["provider", "outcome"],
        )?;
        let reply_parse_failures_total = IntCounterVec::new(
            Opts::new(
                "reply_parse_failures_total",
                "Provider replies that could not be parsed",
            ),
            &["provider"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(analysis_requests_total.clone()))?;
        registry.register(Box::new(reply_parse_failures_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            analysis_requests_total,
            reply_parse_failures_total,
        })
    }

    pub fn record_analysis(&self, provider: &str, outcome: &str) {
        self.analysis_requests_total
            .with_label_values(&[provider, outcome])
            .inc();
    }

    pub fn record_parse_failure(&self, provider: &str) {
        self.reply_parse_failures_total
            .with_label_values(&[provider])
            .inc();
    }

    /// Text exposition format for `/metrics`.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
