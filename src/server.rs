//! Local viewer server.
//!
//! Serves one loaded pack and a static single-page viewer that renders it.
//! The viewer assets are compiled into the binary.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Viewer HTML |
//! | `GET`  | `/app.js` | Viewer script |
//! | `GET`  | `/pack.json` | The loaded pack, excerpts refreshed |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Unknown paths return a JSON error body:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no route for /x" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the pack can be
//! fetched by viewers served from elsewhere.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::citation::normalize_pack;
use crate::models::DocumentPack;

const INDEX_HTML: &str = include_str!("../viewer/index.html");
const APP_JS: &str = include_str!("../viewer/app.js");

#[derive(Clone)]
struct AppState {
    /// The pack with refreshed excerpts, serialized once at startup.
    pack_json: Arc<String>,
}

/// Router serving `pack` and the viewer assets.
///
/// Every citation excerpt is re-resolved from the pack's structure before
/// serving, so the viewer can display `excerpt` as the evidence text.
pub fn viewer_router(pack: &DocumentPack) -> anyhow::Result<Router> {
    let mut served = pack.clone();
    normalize_pack(&mut served);
    let state = AppState {
        pack_json: Arc::new(serde_json::to_string(&served)?),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(handle_index))
        .route("/app.js", get(handle_app_js))
        .route("/pack.json", get(handle_pack))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state))
}

/// Serve the viewer on an already-bound listener until the process ends.
pub async fn serve(listener: tokio::net::TcpListener, pack: DocumentPack) -> anyhow::Result<()> {
    let app = viewer_router(&pack)?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Bind `bind:port` and serve the viewer.
pub async fn run_viewer(pack: DocumentPack, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, title = %pack.source.title, "viewer bound");
    println!("Viewer running at http://{}", addr);
    serve(listener, pack).await
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

async fn handle_not_found(uri: Uri) -> AppError {
    not_found(format!("no route for {}", uri.path()))
}

// ============ Assets ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], APP_JS)
}

async fn handle_pack(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.pack_json.as_str().to_owned(),
    )
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
