//! Outbound provider requests against mocked hosts

use chartcall::catalog::find_preset;
use chartcall::providers::{
    EndpointProvider, GeminiProvider, OpenRouterProvider, ProviderError, VisionProvider,
};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{
    chart, mock_error, provider_settings, request_count, CHART_DATA_URL, GEMINI_KEY, GEMINI_PATH,
    OPENROUTER_KEY, OPENROUTER_PATH,
};

#[tokio::test]
async fn test_gemini_sends_inline_image_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", GEMINI_KEY))
        .and(body_string_contains("inline_data"))
        .and(body_string_contains("iVBORw0KGgo="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"direction\":" }, { "text": "\"PUT\"}" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(provider_settings(
        &server,
        Some(GEMINI_KEY),
        "gemini-1.5-flash",
    ));
    let reply = provider.analyze(&chart(), None).await.unwrap();

    assert_eq!(reply.as_str(), "{\"direction\":\"PUT\"}");

    let requests = server.received_requests().await.unwrap();
    let sent: Value = requests[0].body_json().unwrap();
    let parts = &sent["contents"][0]["parts"];
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    assert_eq!(parts[1]["inline_data"]["data"], "iVBORw0KGgo=");
    assert!(parts[0]["text"].as_str().unwrap().contains("CALL"));
}

#[tokio::test]
async fn test_gemini_without_candidates_yields_blank_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(provider_settings(
        &server,
        Some(GEMINI_KEY),
        "gemini-1.5-flash",
    ));
    let reply = provider.analyze(&chart(), None).await.unwrap();

    assert!(reply.is_blank());
}

#[tokio::test]
async fn test_gemini_unreadable_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(provider_settings(
        &server,
        Some(GEMINI_KEY),
        "gemini-1.5-flash",
    ));
    let err = provider.analyze(&chart(), None).await.unwrap_err();

    assert!(matches!(err, ProviderError::Envelope { provider: "Gemini", .. }));
}

#[tokio::test]
async fn test_openrouter_sends_bearer_and_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OPENROUTER_PATH))
        .and(header(
            "authorization",
            format!("Bearer {}", OPENROUTER_KEY).as_str(),
        ))
        .and(body_partial_json(json!({ "model": "openai/gpt-4o" })))
        .and(body_string_contains("image_url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "{\"direction\":\"CALL\"}" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::new(provider_settings(
        &server,
        Some(OPENROUTER_KEY),
        "openai/gpt-4o",
    ));
    let preset = find_preset("trendspider");
    let reply = provider.analyze(&chart(), preset).await.unwrap();

    assert_eq!(reply.as_str(), "{\"direction\":\"CALL\"}");
    let sent: Value = server.received_requests().await.unwrap()[0]
        .body_json()
        .unwrap();
    let content = &sent["messages"][0]["content"];
    assert_eq!(content[1]["image_url"]["url"], CHART_DATA_URL);
    assert!(content[0]["text"]
        .as_str()
        .unwrap()
        .contains(preset.unwrap().specialty));
}

#[tokio::test]
async fn test_openrouter_without_choices_yields_blank_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OPENROUTER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::new(provider_settings(
        &server,
        Some(OPENROUTER_KEY),
        "openai/gpt-4o",
    ));

    assert!(provider.analyze(&chart(), None).await.unwrap().is_blank());
}

#[tokio::test]
async fn test_missing_key_never_reaches_the_network() {
    let server = MockServer::start().await;

    let gemini = GeminiProvider::new(provider_settings(&server, None, "gemini-1.5-flash"));
    let openrouter = OpenRouterProvider::new(provider_settings(&server, None, "openai/gpt-4o"));

    assert!(matches!(
        gemini.analyze(&chart(), None).await,
        Err(ProviderError::MissingApiKey { provider: "Gemini" })
    ));
    assert!(matches!(
        openrouter.analyze(&chart(), None).await,
        Err(ProviderError::MissingApiKey {
            provider: "OpenRouter"
        })
    ));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_plain_text_error_body_kept_as_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OPENROUTER_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::new(provider_settings(
        &server,
        Some(OPENROUTER_KEY),
        "openai/gpt-4o",
    ));
    let err = provider.analyze(&chart(), None).await.unwrap_err();

    match err {
        ProviderError::Upstream {
            provider,
            status,
            details,
        } => {
            assert_eq!(provider, "OpenRouter");
            assert_eq!(status, 503);
            assert_eq!(details, Value::String("upstream overloaded".to_string()));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let settings = chartcall::config::ProviderSettings::new(
        Some(OPENROUTER_KEY.to_string()),
        Url::parse("http://127.0.0.1:1").unwrap(),
        "openai/gpt-4o",
    );
    let provider = OpenRouterProvider::new(settings);

    let err = provider.analyze(&chart(), None).await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport { .. }));
    assert_eq!(err.provider(), "OpenRouter");
}

#[tokio::test]
async fn test_endpoint_posts_image_and_preset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/analyze-with-gemini"))
        .and(body_partial_json(json!({
            "imageUrl": CHART_DATA_URL,
            "selectedAI": "binary-vision"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "asset": "USD/JPY",
            "direction": "PUT",
            "confidence": 77,
            "reasoning": "Estrela cadente na resistência.",
            "pattern": "Shooting Star",
            "message": "Análise detalhada via Gemini API."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/functions/v1/analyze-with-gemini", server.uri())).unwrap();
    let provider = EndpointProvider::new(url);
    let reply = provider
        .analyze(&chart(), find_preset("binary-vision"))
        .await
        .unwrap();

    let body: Value = serde_json::from_str(reply.as_str()).unwrap();
    assert_eq!(body["direction"], "PUT");
    assert_eq!(body["confidence"], 77);
}

#[tokio::test]
async fn test_endpoint_error_status_is_upstream() {
    let server = MockServer::start().await;
    mock_error(
        &server,
        "/functions/v1/analyze-with-openrouter",
        500,
        json!({ "error": "OpenRouter API key not configured." }),
    )
    .await;

    let url = Url::parse(&format!(
        "{}/functions/v1/analyze-with-openrouter",
        server.uri()
    ))
    .unwrap();
    let err = EndpointProvider::new(url)
        .analyze(&chart(), None)
        .await
        .unwrap_err();

    match err {
        ProviderError::Upstream {
            status, details, ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(details["error"], "OpenRouter API key not configured.");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}
