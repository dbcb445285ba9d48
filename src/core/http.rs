//! HTTP endpoint server using Axum
//!
//! Hosts the request-forwarding endpoints the front-end posts chart images
//! to, plus the full analysis flow, the catalog, health and metrics.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

use crate::capture::{CaptureError, ImagePayload};
use crate::catalog::{self, MarketSession};
use crate::config::{ProviderKind, Settings};
use crate::metrics::Metrics;
use crate::models::{AnalysisMode, AnalysisRequest, AnalysisResult, Timeframe, Verdict};
use crate::normalizer;
use crate::presenter::ResultView;
use crate::providers::{
    GeminiProvider, MockProvider, OpenRouterProvider, ProviderError, VisionProvider,
};
use crate::services::analysis::{outcome_label, AnalysisError, AnalysisService};

/// The providers each route dispatches to.
#[derive(Clone)]
pub struct Providers {
    pub gemini: Arc<dyn VisionProvider>,
    pub openrouter: Arc<dyn VisionProvider>,
    /// Used by `/api/analyze`.
    pub default: Arc<dyn VisionProvider>,
}

impl Providers {
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
        let gemini: Arc<dyn VisionProvider> = Arc::new(GeminiProvider::with_client(
            settings.gemini.clone(),
            client.clone(),
        ));
        let openrouter: Arc<dyn VisionProvider> = Arc::new(OpenRouterProvider::with_client(
            settings.openrouter.clone(),
            client,
        ));
        let default = match settings.default_provider {
            ProviderKind::Gemini => gemini.clone(),
            ProviderKind::OpenRouter => openrouter.clone(),
            ProviderKind::Mock => Arc::new(MockProvider::new()) as Arc<dyn VisionProvider>,
        };
        Self {
            gemini,
            openrouter,
            default,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub providers: Providers,
    detect_cursor: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(providers: Providers, metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            start_time: Arc::new(Instant::now()),
            providers,
            detect_cursor: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Error bodies are always `{"error": ..., "details"?: ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// Provider key missing. Fixed 500, distinguishable by its message.
    NotConfigured(&'static str),
    Upstream {
        provider: &'static str,
        status: u16,
        details: Value,
    },
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::NotConfigured(provider) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("{} API key not configured.", provider) }),
            ),
            ApiError::Upstream {
                provider,
                status,
                details,
            } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                json!({
                    "error": format!("Failed to analyze image with {} API.", provider),
                    "details": details,
                }),
            ),
            ApiError::BadGateway(message) => (StatusCode::BAD_GATEWAY, json!({ "error": message })),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingApiKey { provider } => ApiError::NotConfigured(provider),
            ProviderError::Upstream {
                provider,
                status,
                details,
            } => ApiError::Upstream {
                provider,
                status,
                details,
            },
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

impl From<CaptureError> for ApiError {
    fn from(err: CaptureError) -> Self {
        ApiError::BadRequest(format!("{} ({})", err.user_message(), err))
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(e) => ApiError::BadRequest(e.to_string()),
            AnalysisError::Provider(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Liveness only.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": "healthy",
        "uptime_seconds": uptime_seconds,
        "service": "chartcall"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_requests_in_flight.dec();

    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Deserialize)]
struct ForwardBody {
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
    #[serde(rename = "selectedAI")]
    selected_ai: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForwardReply {
    #[serde(flatten)]
    verdict: Verdict,
    message: String,
}

fn required_image(image_url: Option<String>) -> Result<ImagePayload, ApiError> {
    let image_url = image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image URL (base64) is required.".to_string()))?;
    Ok(ImagePayload::from_data_url(&image_url)?)
}

/// Shared body of the forwarding endpoints: validate, call the provider
/// once, and answer with a fully defaulted verdict.
async fn forward(
    state: &AppState,
    provider: &Arc<dyn VisionProvider>,
    payload: Result<Json<ForwardBody>, JsonRejection>,
) -> Result<Json<ForwardReply>, ApiError> {
    let name = provider.name();
    let Json(body) = payload?;
    let image = required_image(body.image_url).inspect_err(|_| {
        state.metrics.record_analysis(name, "invalid");
    })?;
    let preset = body.selected_ai.as_deref().and_then(catalog::find_preset);
    if body.selected_ai.is_some() && preset.is_none() {
        warn!(selected_ai = ?body.selected_ai, "Unknown preset, analyzing without specialty focus");
    }

    let reply = provider.analyze(&image, preset).await.map_err(|e| {
        error!(provider = name, error = %e, "Forwarded analysis failed");
        state.metrics.record_analysis(name, outcome_label(&e));
        ApiError::from(e)
    })?;

    let resolved = normalizer::resolve_verdict(&reply, name);
    if resolved.diagnostic.is_some() {
        state.metrics.record_parse_failure(name);
    }
    state.metrics.record_analysis(name, "ok");

    Ok(Json(ForwardReply {
        verdict: resolved.verdict,
        message: format!("Análise detalhada via {} API.", name),
    }))
}

async fn analyze_with_gemini(
    State(state): State<AppState>,
    payload: Result<Json<ForwardBody>, JsonRejection>,
) -> Result<Json<ForwardReply>, ApiError> {
    let provider = state.providers.gemini.clone();
    forward(&state, &provider, payload).await
}

async fn analyze_with_openrouter(
    State(state): State<AppState>,
    payload: Result<Json<ForwardBody>, JsonRejection>,
) -> Result<Json<ForwardReply>, ApiError> {
    let provider = state.providers.openrouter.clone();
    forward(&state, &provider, payload).await
}

/// Simulated asset detection; rotates through the OTC symbols.
async fn detect_asset(State(state): State<AppState>) -> Json<Value> {
    let symbols = catalog::instruments(MarketSession::Otc);
    let turn = state.detect_cursor.fetch_add(1, Ordering::Relaxed);
    Json(json!({
        "asset": symbols[turn % symbols.len()],
        "message": "Detecção automática simulada."
    }))
}

async fn catalog_handler() -> Json<Value> {
    Json(json!({
        "presets": catalog::presets(),
        "instruments": {
            "open": catalog::instruments(MarketSession::Open),
            "otc": catalog::instruments(MarketSession::Otc),
        }
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody {
    image_url: Option<String>,
    #[serde(default)]
    mode: AnalysisMode,
    #[serde(rename = "selectedAI")]
    selected_ai: Option<String>,
    instrument: Option<String>,
    #[serde(default)]
    timeframe: Timeframe,
    /// Display offset of the caller's clock; server local time when absent.
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
struct AnalyzeReply {
    result: AnalysisResult,
    view: ResultView,
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalyzeReply>, ApiError> {
    let Json(body) = payload?;
    let image = required_image(body.image_url)?;

    if let Some(symbol) = body.instrument.as_deref().map(str::trim) {
        if !symbol.is_empty() && !catalog::is_known_instrument(symbol) {
            warn!(instrument = symbol, "Instrument not in catalog, using it as given");
        }
    }

    let mut request = AnalysisRequest::new(image, body.mode)
        .with_instrument(body.instrument)
        .with_timeframe(body.timeframe);
    if let Some(preset) = body.selected_ai {
        request = request.with_preset(preset);
    }

    let now = match body.utc_offset_minutes {
        Some(minutes) => {
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("utcOffsetMinutes out of range: {}", minutes))
                })?;
            Utc::now().with_timezone(&offset)
        }
        None => Local::now().fixed_offset(),
    };

    let service =
        AnalysisService::new(state.providers.default.clone()).with_metrics(state.metrics.clone());
    let result = service.run_at(&request, now).await?;
    let view = ResultView::from_result(&result);
    Ok(Json(AnalyzeReply { result, view }))
}

/// Permissive CORS for browser callers, preflight included.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route(
            "/functions/v1/analyze-with-gemini",
            post(analyze_with_gemini),
        )
        .route(
            "/functions/v1/analyze-with-openrouter",
            post(analyze_with_openrouter),
        )
        .route("/functions/v1/detect-asset", post(detect_asset))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/analyze", post(analyze))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(cors_layer()),
        )
        .with_state(state)
}

pub async fn start_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(Metrics::new()?);
    let providers = Providers::from_settings(&settings, reqwest::Client::new());

    if settings.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY not set - the Gemini endpoint will answer 500");
    }
    if settings.openrouter.api_key.is_none() {
        warn!("OPENROUTER_API_KEY not set - the OpenRouter endpoint will answer 500");
    }

    let state = AppState::new(providers, metrics);
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;

    info!(port = settings.port, "HTTP server listening on port {}", settings.port);
    info!(
        provider = ?settings.default_provider,
        "Full-flow analysis available at http://0.0.0.0:{}/api/analyze",
        settings.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
