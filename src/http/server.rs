//! HTTP server setup and request pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Derive client identity and run every API request through the quota gate
//! - Dispatch admitted requests to the upstream proxy
//! - Observability (metrics, request IDs)
//! - Graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::response::QuotaRejection;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::quota::{Decision, IdentityResolver, QuotaGate, QuotaSweeper};
use crate::upstream::{ChatClient, CompletionRequest, GatewayError, ImageComposer, ImageRequest};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<QuotaGate>,
    pub identity: Arc<IdentityResolver>,
    pub chat: Arc<ChatClient>,
    pub image: Arc<ImageComposer>,
}

/// HTTP server for the AI gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    gate: Arc<QuotaGate>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let gate = Arc::new(QuotaGate::new(&config.rate_limit));

        let state = AppState {
            gate: gate.clone(),
            identity: Arc::new(IdentityResolver::new(&config.identity)),
            chat: Arc::new(ChatClient::new(config.chat.clone())),
            image: Arc::new(ImageComposer::new(config.image.clone())),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            gate,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/chat", post(chat_handler))
            .route("/api/image", post(image_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Spawns the quota sweeper alongside the server; both stop when the
    /// shutdown coordinator fires.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = QuotaSweeper::new(self.gate.clone(), self.config.rate_limit.clone());
        let sweeper_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            sweeper.run(sweeper_shutdown).await;
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut server_shutdown = shutdown.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Chat endpoint: identity → quota → upstream completion call.
async fn chat_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let client_id = state.identity.resolve(peer, &headers);

    let response = match state.gate.check(&client_id, Utc::now()) {
        Decision::Rejected { reset_at } => {
            tracing::warn!(client = %client_id, reset_at = %reset_at, "Chat request over quota");
            metrics::record_rate_limited("chat");
            QuotaRejection::new(reset_at).into_response()
        }
        Decision::Admitted => match payload {
            Ok(Json(request)) => match state.chat.complete(&request).await {
                Ok(payload) => Json(payload).into_response(),
                Err(err) => err.into_response(),
            },
            Err(rejection) => reject_body(rejection),
        },
    };

    metrics::record_request("chat", response.status().as_u16(), start);
    response
}

/// Image endpoint: identity → quota → URL composition (no upstream call).
async fn image_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let client_id = state.identity.resolve(peer, &headers);

    let response = match state.gate.check(&client_id, Utc::now()) {
        Decision::Rejected { reset_at } => {
            tracing::warn!(client = %client_id, reset_at = %reset_at, "Image request over quota");
            metrics::record_rate_limited("image");
            QuotaRejection::new(reset_at).into_response()
        }
        Decision::Admitted => match payload {
            Ok(Json(request)) => match state.image.compose(&request) {
                Ok(link) => Json(link).into_response(),
                Err(err) => err.into_response(),
            },
            Err(rejection) => reject_body(rejection),
        },
    };

    metrics::record_request("image", response.status().as_u16(), start);
    response
}

/// An unparseable body is client-caused: answer in the standard error
/// shape instead of the extractor's plain-text default.
fn reject_body(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection, "Request body rejected");
    GatewayError::InvalidInput(rejection.body_text()).into_response()
}
