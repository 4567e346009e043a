use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::gemini::{GeminiError, GenerativeModel, InlineImage, ModelOutput};
use crate::rate_limit::RateLimiter;
use crate::routes::test_support::spawn_server;
use crate::state::test_helpers::{test_app_state, test_app_state_with_model};

// =============================================================================
// MOCK MODEL
// =============================================================================

enum MockBehavior {
    Image,
    Text(&'static str),
    Fail,
}

struct MockModel {
    behavior: MockBehavior,
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn generate_image(&self, _png: &[u8], _prompt: &str) -> Result<ModelOutput, GeminiError> {
        match self.behavior {
            MockBehavior::Image => Ok(ModelOutput {
                images: vec![InlineImage { mime_type: "image/png".into(), data: "aGk=".into() }],
                text: Some("enhanced".into()),
            }),
            _ => Err(GeminiError::ApiResponse { status: 500, body: "boom".into() }),
        }
    }

    async fn generate_text(&self, _png: &[u8], _prompt: &str) -> Result<String, GeminiError> {
        match self.behavior {
            MockBehavior::Text(reply) => Ok(reply.to_owned()),
            _ => Err(GeminiError::ApiResponse { status: 500, body: "boom".into() }),
        }
    }
}

fn image_model() -> Arc<dyn GenerativeModel> {
    Arc::new(MockModel { behavior: MockBehavior::Image })
}

fn stroke_body() -> serde_json::Value {
    json!({
        "strokes": [{
            "points": [{ "x": 10.0, "y": 10.0 }, { "x": 40.0, "y": 30.0 }],
            "color": "black",
            "width": 3.0
        }],
        "canvasWidth": 200,
        "canvasHeight": 100
    })
}

// =============================================================================
// /generate
// =============================================================================

#[tokio::test]
async fn generate_returns_base64_image_parts() {
    let addr = spawn_server(test_app_state_with_model(image_model())).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/generate"))
        .json(&stroke_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["images"][0]["mimeType"], "image/png");
    assert_eq!(body["images"][0]["data"], "aGk=");
    assert_eq!(body["text"], "enhanced");
}

#[tokio::test]
async fn generate_without_a_model_is_unavailable() {
    let addr = spawn_server(test_app_state()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/generate"))
        .json(&stroke_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn generate_rejects_empty_stroke_batches() {
    let addr = spawn_server(test_app_state_with_model(image_model())).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/generate"))
        .json(&json!({ "strokes": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn generate_rejects_malformed_bodies() {
    let addr = spawn_server(test_app_state_with_model(image_model())).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/generate"))
        .header("content-type", "application/json")
        .body("this is not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn generate_surfaces_upstream_failure_as_bad_gateway() {
    let model: Arc<dyn GenerativeModel> = Arc::new(MockModel { behavior: MockBehavior::Fail });
    let addr = spawn_server(test_app_state_with_model(model)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/generate"))
        .json(&stroke_body())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
}

// =============================================================================
// /generate-strokes
// =============================================================================

#[tokio::test]
async fn generate_strokes_returns_the_model_json() {
    let reply = "[{\"points\":[{\"x\":5.0,\"y\":5.0}],\"color\":\"red\",\"width\":2.0}]";
    let model: Arc<dyn GenerativeModel> = Arc::new(MockModel { behavior: MockBehavior::Text(reply) });
    let addr = spawn_server(test_app_state_with_model(model)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/generate-strokes"))
        .json(&json!({
            "strokes": [],
            "userPrompt": "add a bird",
            "canvasWidth": 200,
            "canvasHeight": 100
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let new_strokes: Vec<sketch::Stroke> =
        serde_json::from_str(body["newStrokes"].as_str().unwrap()).unwrap();
    assert_eq!(new_strokes.len(), 1);
}

#[tokio::test]
async fn generation_endpoints_enforce_the_strict_ai_limit() {
    let mut state = test_app_state_with_model(image_model());
    state.limiters.ai = RateLimiter::new(Duration::from_secs(5), 1);
    let addr = spawn_server(state).await;

    let client = reqwest::Client::new();
    let first = client
        .post(format!("http://{addr}/generate"))
        .json(&stroke_body())
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = client
        .post(format!("http://{addr}/generate"))
        .json(&stroke_body())
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"], "Please wait between generations");
}
