use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use smarttrip_api::{build_router, ApiState};
use smarttrip_generation::{GenerationError, Generator, ScriptedClient};
use tower::ServiceExt;

const API_KEY: &str = "test-key";
const MUMBAI_RESPONSE: &str = include_str!("../fixtures/mumbai_response.txt");

fn app(client: &Arc<ScriptedClient>) -> Router {
    build_router(ApiState::new(Generator::scripted(client.clone()), API_KEY))
}

fn mumbai_trip() -> Value {
    json!({
        "destination": "Mumbai",
        "startDate": "2099-06-29",
        "endDate": "2099-07-03",
        "interests": ["history", "nightlife"],
        "budget": 2600,
        "groupType": "solo"
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

fn titles(view: &Value) -> Vec<String> {
    view["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|option| option["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let client = Arc::new(ScriptedClient::new());
    let app = app(&client);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["capabilities"]["generation_backend"], "scripted");
}

#[tokio::test]
async fn trips_require_api_key() {
    let client = Arc::new(ScriptedClient::new());
    let app = app(&client);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/trips")
        .header("content-type", "application/json")
        .body(Body::from(mumbai_trip().to_string()))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn create_trip_returns_three_sanitized_options() {
    let client = Arc::new(ScriptedClient::new());
    client.push_text(MUMBAI_RESPONSE);
    let app = app(&client);

    let (status, view) = send(&app, post_json("/v1/trips", mumbai_trip())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        titles(&view),
        vec!["Colonial Heritage Trail", "Rooftops and Mill Compounds", "Caves and the Sea"]
    );
    assert_eq!(view["duration_days"], 5);
    assert_eq!(view["selected_index"], 0);
    assert_eq!(view["generation"], 1);
    assert_eq!(view["generating"], false);

    let heritage = &view["options"][0];
    assert!(heritage["itinerary"][0]["places"][0]["imageUrl"].is_string());
    assert!(heritage["itinerary"][0]["places"][1].get("imageUrl").is_none());
    assert_eq!(heritage["hotels"][0]["rating"], "5");
    assert!(view["options"][1]["itinerary"][0]["places"][0]
        .get("imageUrl")
        .is_none());
    assert!(view["options"][2]["itinerary"][0]["places"][1]
        .get("imageUrl")
        .is_none());

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("Destination: Mumbai"));
    assert!(prompt.contains("Duration: 5 days"));
    assert!(prompt.contains("Interests: history, nightlife"));

    let session_id = view["session_id"].as_str().unwrap();
    let (status, fetched) = send(&app, get(&format!("/v1/trips/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&fetched), titles(&view));
}

#[tokio::test]
async fn invalid_dates_are_rejected_without_generation() {
    let client = Arc::new(ScriptedClient::new());
    let app = app(&client);

    let mut trip = mumbai_trip();
    trip["endDate"] = json!("2099-06-20");
    let (status, body) = send(&app, post_json("/v1/trips", trip)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let client = Arc::new(ScriptedClient::new());
    let app = app(&client);

    let (status, body) = send(&app, post_json("/v1/trips", json!({ "budget": 500 }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Destination"));
    assert!(message.contains("Start Date"));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn regenerate_replaces_options_and_select_picks_one() {
    let client = Arc::new(ScriptedClient::new());
    client.push_text(MUMBAI_RESPONSE).push_text(
        json!({
            "options": [{
                "title": "Street Food Crawl",
                "description": "Chowpatty to Mohammed Ali Road.",
                "itinerary": [],
                "hotels": []
            }]
        })
        .to_string(),
    );
    let app = app(&client);

    let (_, created) = send(&app, post_json("/v1/trips", mumbai_trip())).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();

    let (status, selected) = send(
        &app,
        post_json(&format!("/v1/trips/{session_id}/select"), json!({ "index": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selected["selected_index"], 2);
    assert_eq!(client.calls(), 1);

    let (status, regenerated) = send(
        &app,
        post_json(&format!("/v1/trips/{session_id}/regenerate"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&regenerated), vec!["Street Food Crawl"]);
    assert_eq!(regenerated["selected_index"], 0);
    assert_eq!(regenerated["generation"], 2);
    assert_eq!(regenerated["generating"], false);
    assert_eq!(client.prompts()[0], client.prompts()[1]);

    let (status, body) = send(
        &app,
        post_json(&format!("/v1/trips/{session_id}/select"), json!({ "index": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "option_out_of_range");
}

#[tokio::test]
async fn failed_regeneration_keeps_previous_options() {
    let client = Arc::new(ScriptedClient::new());
    client
        .push_text(MUMBAI_RESPONSE)
        .push_failure(GenerationError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
        .push_text("Sorry, I cannot plan that trip.");
    let app = app(&client);

    let (_, created) = send(&app, post_json("/v1/trips", mumbai_trip())).await;
    let session_id = created["session_id"].as_str().unwrap().to_string();
    let regenerate = format!("/v1/trips/{session_id}/regenerate");

    let (status, body) = send(&app, post_json(&regenerate, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "transport_error");

    let (status, body) = send(&app, post_json(&regenerate, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "parse_error");

    let (_, fetched) = send(&app, get(&format!("/v1/trips/{session_id}"))).await;
    assert_eq!(titles(&fetched), titles(&created));
    assert_eq!(fetched["generation"], 1);
    assert_eq!(fetched["generating"], false);
}

#[tokio::test]
async fn first_generation_failure_stores_no_session() {
    let client = Arc::new(ScriptedClient::new());
    client.push_failure(GenerationError::EmptyResponse);
    let app = app(&client);

    let (status, body) = send(&app, post_json("/v1/trips", mumbai_trip())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "transport_error");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["active_sessions"], 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let client = Arc::new(ScriptedClient::new());
    let app = app(&client);

    let (status, body) = send(
        &app,
        get("/v1/trips/00000000-0000-4000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
}

#[tokio::test]
async fn malformed_trip_body_gets_json_error() {
    let client = Arc::new(ScriptedClient::new());
    let app = app(&client);

    let mut fractional_budget = mumbai_trip();
    fractional_budget["budget"] = json!(12.5);
    let (status, body) = send(&app, post_json("/v1/trips", fractional_budget)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    let mut bad_date = mumbai_trip();
    bad_date["startDate"] = json!("tomorrow");
    let (status, body) = send(&app, post_json("/v1/trips", bad_date)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn idle_sessions_expire() {
    let client = Arc::new(ScriptedClient::new());
    client.push_text(MUMBAI_RESPONSE);
    let state = ApiState::new(Generator::scripted(client.clone()), API_KEY)
        .with_session_ttl(Duration::ZERO);
    let app = build_router(state.clone());

    let (status, created) = send(&app, post_json("/v1/trips", mumbai_trip())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(state.sessions.read().len(), 1);

    let session_id = created["session_id"].as_str().unwrap();
    let (status, body) = send(&app, get(&format!("/v1/trips/{session_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
    assert!(state.sessions.read().is_empty());
}
