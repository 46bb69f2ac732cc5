//! HTTP view server for browser dashboards.
//!
//! Re-exposes the aggregated catalog over a small JSON API:
//!
//! - `GET /api/prompts?projection=&search=&scope=` - ordered groups + stats
//! - `GET /api/prompts/stats` - per-function rollup
//! - `POST /api/refresh` - re-fetch the upstream catalog into the snapshot
//!
//! The server owns no data of its own; every response is derived from the
//! explorer's current snapshot at request time. CORS is wide open so a
//! dashboard served from anywhere can read the API - there is nothing here
//! but derived views of data the caller already controls.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app::prompt_explorer::{CatalogClient, Projection, PromptExplorer};

/// How many consecutive ports to probe when the requested one is taken.
const PORT_PROBE_ATTEMPTS: u16 = 10;

/// Running view server handle.
pub struct ViewServer {
    port: u16,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

/// Shared state passed to all request handlers.
#[derive(Clone)]
struct AppState {
    explorer: Arc<PromptExplorer>,
    client: Arc<CatalogClient>,
    upstream_url: Option<String>,
}

/// Generic API error body.
#[derive(Debug, Serialize)]
struct ApiError {
    success: bool,
    error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}

impl ViewServer {
    /// Start serving on `requested_port`, probing upward if it is in use.
    pub async fn start(
        explorer: Arc<PromptExplorer>,
        client: Arc<CatalogClient>,
        upstream_url: Option<String>,
        requested_port: u16,
    ) -> anyhow::Result<Self> {
        let state = AppState {
            explorer,
            client,
            upstream_url,
        };

        // Dashboard pages load from arbitrary origins (file://, dev servers)
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .route("/api/prompts", get(get_prompts))
            .route("/api/prompts/stats", get(get_prompt_stats))
            .route("/api/refresh", post(refresh_catalog))
            .with_state(state)
            .layer(cors);

        let (listener, port) = bind_available_port(requested_port).await?;
        info!("🚀 View server listening on http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("view server failed");
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("🛑 View server shutdown initiated");
        }
    }
}

/// Bind the first free port in `[start, start + PORT_PROBE_ATTEMPTS)`.
async fn bind_available_port(start: u16) -> anyhow::Result<(TcpListener, u16)> {
    for offset in 0..PORT_PROBE_ATTEMPTS {
        let port = start.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => {
                if port != start {
                    warn!("Port {} is in use, using port {} instead", start, port);
                }
                return Ok((listener, port));
            }
            Err(_) => continue,
        }
    }
    anyhow::bail!(
        "no available port in {}..{}",
        start,
        start.saturating_add(PORT_PROBE_ATTEMPTS)
    )
}

#[derive(Debug, Deserialize)]
struct ViewParams {
    projection: Option<String>,
    search: Option<String>,
    scope: Option<String>,
}

/// `GET /api/prompts` - the grouped, filtered, stat-annotated catalog view.
async fn get_prompts(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Response {
    let projection = match &params.projection {
        Some(name) => match Projection::parse(name) {
            Some(projection) => projection,
            None => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    format!(
                        "unknown projection {:?}; expected function, project, or run",
                        name
                    ),
                )
            }
        },
        None => Projection::ByFunctionVersion,
    };

    let view = state.explorer.view_with(
        projection,
        params.search.as_deref().unwrap_or(""),
        params.scope.as_deref(),
    );
    Json(view).into_response()
}

/// `GET /api/prompts/stats` - per-function rollup of the current snapshot.
async fn get_prompt_stats(State(state): State<AppState>) -> Response {
    Json(state.explorer.stats_report()).into_response()
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    success: bool,
    applied: bool,
    total_records: usize,
}

/// `POST /api/refresh` - pull the upstream catalog into the snapshot.
///
/// A stale completion (an older fetch finishing after a newer one) reports
/// `applied: false`; the visible snapshot is already newer than the result.
async fn refresh_catalog(State(state): State<AppState>) -> Response {
    let Some(upstream_url) = state.upstream_url.clone() else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "no upstream catalog URL configured",
        );
    };

    match state.explorer.refresh(&state.client, &upstream_url).await {
        Ok(applied) => {
            let total_records = state.explorer.snapshot().records.len();
            Json(RefreshResponse {
                success: true,
                applied,
                total_records,
            })
            .into_response()
        }
        Err(e) => {
            warn!("❌ Catalog refresh failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
