//! Dispatcher, normalizer and UI state wired together

use std::sync::Arc;

use chartcall::metrics::Metrics;
use chartcall::models::{AnalysisMode, AnalysisRequest, Direction, Timeframe, ValidationError};
use chartcall::providers::{EndpointProvider, MockProvider};
use chartcall::services::analysis::{AnalysisError, AnalysisService, RETRY_MESSAGE};
use chartcall::store::{reduce, Phase, UiAction, UiState};
use chrono::{DateTime, FixedOffset, TimeZone};
use url::Url;

use crate::test_utils::{chart, mock_openrouter_reply, request_count, TestApiServer};

fn sao_paulo(hour: u32, minute: u32, second: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(-3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 17, hour, minute, second)
        .unwrap()
}

fn endpoint(addr: std::net::SocketAddr, route: &str) -> Arc<EndpointProvider> {
    let url = Url::parse(&format!("http://{}{}", addr, route)).unwrap();
    Arc::new(EndpointProvider::new(url))
}

#[tokio::test]
async fn test_mock_provider_flow_is_fully_populated() {
    let service = AnalysisService::new(Arc::new(MockProvider::new()));
    let request = AnalysisRequest::new(chart(), AnalysisMode::Automatic).with_timeframe(Timeframe::M5);

    let first = service.run_at(&request, sao_paulo(10, 2, 0)).await.unwrap();
    let second = service.run_at(&request, sao_paulo(10, 2, 0)).await.unwrap();

    assert_eq!(first.ai_used_label, "Análise Automática (Todas as IAs)");
    assert_eq!(first.entry_timestamp, sao_paulo(10, 5, 0));
    assert_ne!(first.direction, Direction::Neutral);
    assert!(!first.reasoning.is_empty());
    assert_ne!(first.instrument, second.instrument);
}

#[tokio::test]
async fn test_browser_path_through_forwarding_endpoint() {
    let app = TestApiServer::new().await;
    mock_openrouter_reply(
        &app.openrouter,
        "```json\n{\"asset\":\"ETH/USD\",\"direction\":\"put\",\"confidence\":\"83%\",\"reasoning\":\"Rompimento de suporte.\",\"pattern\":\"Bearish Engulfing\"}\n```",
    )
    .await;
    let addr = app.spawn_http().await;

    let service = AnalysisService::new(endpoint(addr, "/functions/v1/analyze-with-openrouter"))
        .with_metrics(app.metrics.clone());
    let request = AnalysisRequest::new(chart(), AnalysisMode::Single)
        .with_preset("chartgpt")
        .with_instrument(Some("BTC/USD (OTC)".to_string()));

    let result = service.run_at(&request, sao_paulo(14, 41, 30)).await.unwrap();

    assert_eq!(result.instrument, "BTC/USD (OTC)");
    assert_eq!(result.direction, Direction::Put);
    assert_eq!(result.confidence, 83);
    assert_eq!(result.pattern, "Bearish Engulfing");
    assert_eq!(result.entry_timestamp, sao_paulo(14, 42, 30));
    assert_eq!(result.ai_used_label, "ChartGPT Analysis");
    assert_eq!(request_count(&app.openrouter).await, 1);

    let metrics = app.metrics.export().unwrap();
    assert!(metrics.contains("provider=\"endpoint\""));
    assert!(metrics.contains("provider=\"OpenRouter\""));
}

#[tokio::test]
async fn test_browser_path_without_key_surfaces_retry_message() {
    let app = TestApiServer::with_keys(None, None).await;
    let addr = app.spawn_http().await;

    let service = AnalysisService::new(endpoint(addr, "/functions/v1/analyze-with-gemini"));
    let request = AnalysisRequest::new(chart(), AnalysisMode::Consensus);

    let err = service.run(&request).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Provider(_)));
    assert_eq!(err.user_message(), RETRY_MESSAGE);
    assert_eq!(request_count(&app.gemini).await, 0);
}

#[tokio::test]
async fn test_invalid_request_is_not_dispatched() {
    let app = TestApiServer::new().await;
    let addr = app.spawn_http().await;
    let metrics = Arc::new(Metrics::new().unwrap());

    let service = AnalysisService::new(endpoint(addr, "/functions/v1/analyze-with-openrouter"))
        .with_metrics(metrics.clone());
    let request = AnalysisRequest::new(chart(), AnalysisMode::Single).with_preset("no-such-ai");

    let err = service.run(&request).await.unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::Validation(ValidationError::UnknownPreset(_))
    ));
    assert_eq!(request_count(&app.openrouter).await, 0);
    assert!(metrics.export().unwrap().contains("outcome=\"invalid\""));
}

#[tokio::test]
async fn test_store_drives_one_analysis_cycle() {
    let service = AnalysisService::new(Arc::new(MockProvider::new()));

    let state = reduce(UiState::default(), UiAction::ImageCaptured(chart()));
    let state = reduce(state, UiAction::InstrumentSelected(Some("GOLD".to_string())));
    let request = state.build_request(AnalysisMode::Consensus).unwrap();
    let state = reduce(state, UiAction::AnalysisStarted(AnalysisMode::Consensus));
    assert!(state.status_message().is_some());

    let state = match service.run_at(&request, sao_paulo(9, 0, 10)).await {
        Ok(result) => reduce(state, UiAction::AnalysisSucceeded(result)),
        Err(e) => reduce(state, UiAction::AnalysisFailed(e.user_message())),
    };

    assert_eq!(state.phase, Phase::Showing);
    let view = state.result_view().unwrap();
    assert_eq!(view.instrument, "GOLD");
    assert_eq!(view.confidence, "98%");
    assert_eq!(view.entry_time, "09:01");
    assert!(state.image.is_some());
}

#[tokio::test]
async fn test_forwarded_diagnostic_verdict_is_kept_as_is() {
    let app = TestApiServer::new().await;
    mock_openrouter_reply(&app.openrouter, "```json\n{\"direction\": CALL\n```").await;
    let addr = app.spawn_http().await;

    let service = AnalysisService::new(endpoint(addr, "/functions/v1/analyze-with-openrouter"))
        .with_metrics(app.metrics.clone());
    let request = AnalysisRequest::new(chart(), AnalysisMode::Automatic);

    let result = service.run_at(&request, sao_paulo(11, 0, 0)).await.unwrap();

    assert_eq!(result.direction, Direction::Neutral);
    assert_eq!(result.confidence, 50);
    assert!(result
        .reasoning
        .starts_with("Erro ao processar análise da IA (OpenRouter)."));
    assert!(result.reasoning.contains("```json"));

    let metrics = app.metrics.export().unwrap();
    assert!(metrics.contains("reply_parse_failures_total{provider=\"OpenRouter\"} 1"));
    assert!(!metrics.contains("reply_parse_failures_total{provider=\"endpoint\"}"));
}

#[tokio::test]
async fn test_forwarded_reasoning_with_backticks_survives() {
    let app = TestApiServer::new().await;
    mock_openrouter_reply(
        &app.openrouter,
        r#"{"asset":"EUR/USD","direction":"CALL","confidence":90,"reasoning":"Model said ```json\nbroken\n``` earlier","pattern":"Hammer"}"#,
    )
    .await;
    let addr = app.spawn_http().await;

    let service = AnalysisService::new(endpoint(addr, "/functions/v1/analyze-with-openrouter"));
    let request = AnalysisRequest::new(chart(), AnalysisMode::Automatic);

    let result = service.run_at(&request, sao_paulo(11, 0, 0)).await.unwrap();

    assert_eq!(result.instrument, "EUR/USD");
    assert_eq!(result.direction, Direction::Call);
    assert_eq!(result.confidence, 90);
    assert_eq!(result.reasoning, "Model said ```json\nbroken\n``` earlier");
    assert_eq!(result.pattern, "Hammer");
}
