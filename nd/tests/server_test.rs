//! End-to-end tests: router, Notion client and Gemini client together,
//! with both remote APIs served by mock servers.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use notiond::assistant::EMPTY_PAGE;
use notiond::config::Config;
use notiond::llm::create_generator;
use notiond::prompts::PromptLoader;
use notiond::server::{AppState, create_router};
use notiond::workspace::NotionConnector;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_KEY_ENV: &str = "NOTIOND_E2E_GEMINI_KEY";

struct Remotes {
    notion: MockServer,
    gemini: MockServer,
}

async fn router() -> (Router, Remotes) {
    let remotes = Remotes {
        notion: MockServer::start().await,
        gemini: MockServer::start().await,
    };

    // SAFETY: serialized by #[serial]; no other thread reads this variable
    unsafe { std::env::set_var(GEMINI_KEY_ENV, "test-key") };

    let mut config = Config::default();
    config.notion.base_url = remotes.notion.uri();
    config.gemini.base_url = remotes.gemini.uri();
    config.gemini.api_key_env = GEMINI_KEY_ENV.to_string();

    let state = AppState {
        generator: create_generator(&config.gemini).unwrap(),
        connector: Arc::new(NotionConnector::new(config.notion.clone()).unwrap()),
        default_token: None,
        prompts: Arc::new(PromptLoader::embedded_only()),
        config: Arc::new(config),
    };
    (create_router(state), remotes)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", "Bearer secret_caller")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn gemini_says(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] }, "finishReason": "STOP" }]
    }))
}

#[tokio::test]
#[serial]
async fn test_summarize_end_to_end() {
    let (router, remotes) = router().await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/p1/children"))
        .and(header("authorization", "Bearer secret_caller"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "type": "paragraph",
                "paragraph": {"rich_text": [{"plain_text": "Ship the beta in March."}]}
            }],
            "has_more": false
        })))
        .expect(1)
        .mount(&remotes.notion)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Ship the beta in March."))
        .respond_with(gemini_says("Beta ships in March."))
        .expect(1)
        .mount(&remotes.gemini)
        .await;

    let (status, body) = post(&router, "/api/summarize", json!({"pageId": "p1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "Beta ships in March.");
}

#[tokio::test]
#[serial]
async fn test_empty_page_skips_generation() {
    let (router, remotes) = router().await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/blank/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "has_more": false
        })))
        .expect(1)
        .mount(&remotes.notion)
        .await;
    Mock::given(method("POST"))
        .respond_with(gemini_says("should not be asked"))
        .expect(0)
        .mount(&remotes.gemini)
        .await;

    let (status, body) = post(&router, "/api/summarize", json!({"pageId": "blank"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], EMPTY_PAGE);
}

#[tokio::test]
#[serial]
async fn test_missing_page_maps_to_404() {
    let (router, remotes) = router().await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/gone/children"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "object": "error",
            "status": 404,
            "message": "Could not find block with ID: gone."
        })))
        .mount(&remotes.notion)
        .await;

    let (status, body) = post(&router, "/api/summarize", json!({"pageId": "gone"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Failed to summarize page");
    assert!(body["details"].as_str().unwrap().contains("Could not find block"));
}

#[tokio::test]
#[serial]
async fn test_summary_written_back_as_callout() {
    let (router, remotes) = router().await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/p1/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "type": "paragraph",
                "paragraph": {"rich_text": [{"plain_text": "Hiring plan for Q3."}]}
            }],
            "has_more": false
        })))
        .mount(&remotes.notion)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/blocks/p1/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&remotes.notion)
        .await;
    Mock::given(method("POST"))
        .respond_with(gemini_says("Two hires in Q3."))
        .mount(&remotes.gemini)
        .await;

    let (status, body) = post(
        &router,
        "/mcp/tools/add_ai_summary_block",
        json!({"pageId": "p1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("isError").is_none());

    let patches: Vec<Value> = remotes
        .notion
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(patches.len(), 1);
    let callout = &patches[0]["children"][0];
    assert_eq!(callout["type"], "callout");
    assert_eq!(callout["callout"]["color"], "blue_background");
}
