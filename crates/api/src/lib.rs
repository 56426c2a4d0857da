use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smarttrip_agents::{ItineraryPlanner, PipelineError, PlanningSession, SessionView};
use smarttrip_core::TripForm;
use smarttrip_generation::Generator;
use smarttrip_observability::{AppMetrics, MetricsSnapshot};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "dev-smarttrip-key";
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24;
const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "https://smarttrip.app",
];

#[derive(Clone)]
pub struct ApiState {
    pub planner: ItineraryPlanner<Generator>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<PlanningSession>>>>,
    pub session_ttl: Duration,
    pub allowed_origins: Arc<Vec<String>>,
}

impl ApiState {
    pub fn new(generator: Generator, api_key: impl Into<String>) -> Self {
        let metrics = AppMetrics::shared();
        Self {
            planner: ItineraryPlanner::new(Arc::new(generator), metrics.clone()),
            metrics,
            api_key: api_key.into(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl: session_ttl_from_env(),
            allowed_origins: Arc::new(parse_origin_list(
                env::var("SMARTTRIP_ALLOWED_ORIGINS").ok().as_deref(),
            )),
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Looks a session up, evicting it when it has been idle past the TTL.
    fn session(&self, id: Uuid) -> Option<Arc<PlanningSession>> {
        let session = self.sessions.read().get(&id).cloned()?;
        if session.is_expired(self.session_ttl, chrono::Utc::now()) {
            self.sessions.write().remove(&id);
            debug!(session_id = %id, "expired trip session evicted");
            return None;
        }
        Some(session)
    }

    fn prune_expired_sessions(&self) {
        let now = chrono::Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.session_ttl, now));
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, remaining = sessions.len(), "expired trip sessions pruned");
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    capabilities: HealthCapabilities,
    active_sessions: usize,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    generation_backend: &'static str,
    generation_configured: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct SelectOptionRequest {
    index: usize,
}

pub fn build_app() -> Result<Router> {
    let generator = Generator::from_env().context("failed to build generation client")?;
    let api_key = env::var("SMARTTRIP_API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());

    let state = ApiState::new(generator, api_key);
    info!(
        backend = state.planner.client().backend_name(),
        configured = state.planner.client().is_configured(),
        "generation backend ready"
    );

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/trips", post(create_trip))
        .route("/v1/trips/:session_id", get(get_trip))
        .route("/v1/trips/:session_id/regenerate", post(regenerate_trip))
        .route("/v1/trips/:session_id/select", post(select_option))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let generator = state.planner.client();
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        capabilities: HealthCapabilities {
            generation_backend: generator.backend_name(),
            generation_configured: generator.is_configured(),
        },
        active_sessions: state.sessions.read().len(),
    };
    (StatusCode::OK, Json(payload))
}

async fn create_trip(
    State(state): State<ApiState>,
    payload: Result<Json<TripForm>, JsonRejection>,
) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => return json_rejection_response(&rejection),
    };

    let today = chrono::Utc::now().date_naive();
    match state.planner.plan(&form, today).await {
        Ok((session, view)) => {
            state.prune_expired_sessions();
            state.sessions.write().insert(session.id(), session);
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Err(error) => pipeline_error_response(&error),
    }
}

async fn get_trip(State(state): State<ApiState>, Path(session_id): Path<Uuid>) -> Response {
    match state.session(session_id) {
        Some(session) => (StatusCode::OK, Json(session.view())).into_response(),
        None => session_not_found(session_id),
    }
}

async fn regenerate_trip(State(state): State<ApiState>, Path(session_id): Path<Uuid>) -> Response {
    let Some(session) = state.session(session_id) else {
        return session_not_found(session_id);
    };

    match state.planner.regenerate(&session).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => pipeline_error_response(&error),
    }
}

async fn select_option(
    State(state): State<ApiState>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<SelectOptionRequest>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => return json_rejection_response(&rejection),
    };
    let Some(session) = state.session(session_id) else {
        return session_not_found(session_id);
    };

    match session.select(input.index) {
        Ok(_) => {
            let view: SessionView = session.view();
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => pipeline_error_response(&error),
    }
}

fn pipeline_error_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Busy => StatusCode::CONFLICT,
        PipelineError::OptionOutOfRange { .. } => StatusCode::BAD_REQUEST,
        PipelineError::Transport(_) | PipelineError::Parse(_) | PipelineError::Schema { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn pipeline_error_response(error: &PipelineError) -> Response {
    (
        pipeline_error_status(error),
        Json(serde_json::json!({
            "error": error.kind(),
            "message": error.to_string()
        })),
    )
        .into_response()
}

fn json_rejection_response(rejection: &JsonRejection) -> Response {
    warn!(status = rejection.status().as_u16(), "request body rejected");
    (
        rejection.status(),
        Json(serde_json::json!({
            "error": "validation_error",
            "message": rejection.body_text()
        })),
    )
        .into_response()
}

fn session_not_found(session_id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "session_not_found",
            "message": format!("no trip session {session_id}")
        })),
    )
        .into_response()
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

fn session_ttl_from_env() -> Duration {
    Duration::from_secs(
        env::var("SMARTTRIP_SESSION_TTL_SECONDS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS),
    )
}

fn default_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS
        .iter()
        .map(|value| value.to_string())
        .collect()
}

/// Comma separated origins. An unset or effectively empty value falls back
/// to the defaults.
fn parse_origin_list(raw: Option<&str>) -> Vec<String> {
    let origins = raw
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if origins.is_empty() {
        default_origins()
    } else {
        origins
    }
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|origin| HeaderValue::from_static(*origin))
            .collect()
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}
