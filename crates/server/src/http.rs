//! HTTP Endpoints
//!
//! REST API for the medical assistant.

use axum::{
    extract::{rejection::JsonRejection, Json, MatchedPath, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use medibot_config::constants::timeouts::READINESS_PROBE_SECS;
use medibot_core::{Error, ResponseEnvelope};

use crate::metrics::{metrics_handler, record_request};
use crate::state::AppState;
use crate::ServerError;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Extra time the outer layer allows past the chat deadline, so the chat
/// handler answers with its own JSON error first
const TIMEOUT_LAYER_GRACE_SECS: u64 = 5;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );
    let request_timeout = Duration::from_secs(
        state.config.server.request_timeout_seconds + TIMEOUT_LAYER_GRACE_SECS,
    );

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/calendar", get(calendar))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_requests))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no configured origin parses, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let mut parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        parsed_origins.push(HeaderValue::from_static(FALLBACK_ORIGIN));
    } else {
        tracing::info!("CORS configured with {} origins", parsed_origins.len());
    }

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Count requests by matched route and status
async fn track_requests(matched: Option<MatchedPath>, request: Request, next: Next) -> Response {
    let route = matched
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    record_request(&route, response.status().as_u16());
    response
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: ResponseEnvelope,
}

/// Chat endpoint
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable chat request body");
            return Err(Error::missing_message().into());
        }
    };

    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(Error::missing_message)?;
    let user_id = request
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.default_user_id().to_string());

    let span = tracing::info_span!("chat", request_id = %Uuid::new_v4(), user_id = %user_id);
    let deadline = Duration::from_secs(state.config.server.request_timeout_seconds);
    let response = tokio::time::timeout(
        deadline,
        state.engine.process(&user_id, &message).instrument(span),
    )
    .await
    .map_err(|_| Error::Timeout("chat response".to_string()))??;

    Ok(Json(ChatResponse { response }))
}

/// Calendar placeholder; events live in the frontend calendar
async fn calendar() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "events": [] }))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "sessions": {
                "status": "ok",
                "count": state.sessions().count(),
            },
            "resolver_policy": state.engine.resolver_policy(),
        }
    }))
}

/// Readiness check with LLM backend connectivity
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let llm = state.engine.llm();

    let llm_status = match tokio::time::timeout(
        Duration::from_secs(READINESS_PROBE_SECS),
        llm.is_available(),
    )
    .await
    {
        Ok(true) => "ok",
        Ok(false) => "unreachable",
        Err(_) => "timeout",
    };
    let ready = llm_status == "ok";

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "llm_backend": {
                    "status": llm_status,
                    "model": llm.model_name(),
                },
                "sessions": {
                    "status": "ok",
                    "count": state.sessions().count(),
                },
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest};
    use medibot_config::Settings;
    use medibot_core::{LanguageModel, Result};
    use medibot_tools::{KeywordResolver, StubPlacesSearch};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct CannedLlm {
        reply: Option<&'static str>,
        available: bool,
    }

    struct StalledLlm;

    #[async_trait]
    impl LanguageModel for StalledLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "stalled"
        }
    }

    #[async_trait]
    impl LanguageModel for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.reply
                .map(str::to_string)
                .ok_or_else(|| Error::CompletionUnavailable("503 Service Unavailable".into()))
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn app(reply: Option<&'static str>, available: bool) -> (Router, AppState) {
        let state = AppState::new(
            Settings::default(),
            Arc::new(CannedLlm { reply, available }),
            Arc::new(KeywordResolver::new()),
            Arc::new(StubPlacesSearch::new()),
        );
        (create_router(state.clone()), state)
    }

    fn post_chat(body: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_greeting() {
        let (router, state) = app(None, true);
        let response = router.oneshot(post_chat(r#"{"message": "hi"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["response"]["text"], "Hello! How can I help you today?");
        assert!(body["response"]["eventDetails"].is_null());
        // no user_id falls back to the configured default
        assert!(state.sessions().contains("default"));
    }

    #[tokio::test]
    async fn test_chat_uses_user_id() {
        let (router, state) = app(None, true);
        router
            .oneshot(post_chat(r#"{"message": "hello", "user_id": "patient-7"}"#))
            .await
            .unwrap();
        assert!(state.sessions().contains("patient-7"));
        assert!(!state.sessions().contains("default"));
    }

    #[tokio::test]
    async fn test_chat_delegated_reply() {
        let (router, _) = app(Some("Drink water and rest."), true);
        let response = router
            .oneshot(post_chat(r#"{"message": "how do I treat a hangover"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["response"]["text"], "Drink water and rest.");
    }

    #[tokio::test]
    async fn test_chat_missing_message() {
        for body in [r#"{}"#, r#"{"message": "   "}"#, r#"{"user_id": "x"}"#, "not json"] {
            let (router, _) = app(None, true);
            let response = router.oneshot(post_chat(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(json_body(response).await["error"], "Message is required");
        }
    }

    #[tokio::test]
    async fn test_chat_llm_failure_is_500() {
        let (router, _) = app(None, true);
        let response = router
            .oneshot(post_chat(r#"{"message": "what causes migraines"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("Error generating response from AI model:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_deadline_returns_json_500() {
        let mut settings = Settings::default();
        settings.server.request_timeout_seconds = 1;
        let state = AppState::new(
            settings,
            Arc::new(StalledLlm),
            Arc::new(KeywordResolver::new()),
            Arc::new(StubPlacesSearch::new()),
        );

        let response = create_router(state)
            .oneshot(post_chat(r#"{"message": "what causes migraines"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(
            body["error"],
            "Error generating response from AI model: Timed out waiting for chat response"
        );
    }

    #[tokio::test]
    async fn test_calendar_placeholder() {
        let (router, _) = app(None, true);
        let response = router.oneshot(get("/api/calendar")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "events": [] }));
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app(None, true);
        let response = router.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"]["resolver_policy"], "keyword");
        assert_eq!(body["checks"]["sessions"]["count"], 0);
    }

    #[tokio::test]
    async fn test_ready_reflects_llm() {
        let (router, _) = app(None, true);
        let response = router.oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (router, _) = app(None, false);
        let response = router.oneshot(get("/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["checks"]["llm_backend"]["status"], "unreachable");
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let (router, _) = app(None, true);
        let response = router.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_cors_falls_back_on_invalid_origins() {
        // builds without panicking for every configuration
        build_cors_layer(&[], true);
        build_cors_layer(&["not a header\n".to_string()], true);
        build_cors_layer(&["https://medibot.example".to_string()], true);
        build_cors_layer(&[], false);
    }
}
