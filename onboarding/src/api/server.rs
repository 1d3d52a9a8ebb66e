//! HTTP service for bulk onboarding.
//!
//! Wraps the pipeline for dashboards that upload files instead of linking the
//! library. The employee API is reached with the service's configured token,
//! or with the caller's own bearer token when the request carries one.
//!
//! # API Endpoints
//!
//! | Method | Path                       | Description                              |
//! |--------|----------------------------|------------------------------------------|
//! | GET    | `/health`                  | Health check                             |
//! | POST   | `/api/employees/preview`   | Parse and validate a CSV (no import)     |
//! | POST   | `/api/employees/import`    | Parse, then import valid rows            |
//! | GET    | `/api/logs`                | SSE stream of logs and import progress   |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, ImportResponse, PreviewResponse};
use crate::client::{HttpEmployeeApi, RequestTracker};
use crate::config::{ClientConfig, MAX_UPLOAD_SIZE};
use crate::error::ServerResult;
use crate::import::import_employees;
use crate::parser::parse_employees_bytes;

type ApiFailure = (StatusCode, Json<Value>);

/// Shared service state.
#[derive(Clone)]
pub struct AppState {
    api: Arc<HttpEmployeeApi>,
    tracker: RequestTracker,
}

impl AppState {
    pub fn new(config: ClientConfig) -> ServerResult<Self> {
        let tracker = RequestTracker::new();
        let api = HttpEmployeeApi::new(config)?.with_tracker(tracker.clone());
        Ok(Self {
            api: Arc::new(api),
            tracker,
        })
    }

    /// Client for one request, using the caller's bearer token if present.
    fn api_for(&self, headers: &HeaderMap) -> Result<Arc<HttpEmployeeApi>, ApiFailure> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match token {
            None => Ok(self.api.clone()),
            Some(token) => {
                let config = self.api.config().clone().with_token(token);
                HttpEmployeeApi::new(config)
                    .map(|api| Arc::new(api.with_tracker(self.tracker.clone())))
                    .map_err(|e| {
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&e.to_string())))
                    })
            }
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/employees/preview", post(preview_csv))
        .route("/api/employees/import", post(import_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, config: ClientConfig) -> ServerResult<()> {
    let api_url = config.base_url.clone();
    let app = router(AppState::new(config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 Onboarding service running on http://localhost:{}", port);
    eprintln!("   POST /api/employees/preview - Validate a CSV file");
    eprintln!("   POST /api/employees/import  - Import a CSV file");
    eprintln!("   GET  /api/logs              - SSE log stream");
    eprintln!("   GET  /health                - Health check");
    eprintln!("   Employee API: {}", api_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "podium-onboarding",
        "version": env!("CARGO_PKG_VERSION"),
        "inFlightRequests": state.tracker.in_flight(),
        "endpoints": {
            "preview": "POST /api/employees/preview",
            "import": "POST /api/employees/import",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers just skip what they missed.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Read the `file` field of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<(Option<String>, Vec<u8>), ApiFailure> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, Json(error_response(&format!("Multipart error: {}", e))))
    })? {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| {
                (StatusCode::BAD_REQUEST, Json(error_response(&format!("Read error: {}", e))))
            })?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes =
        file_data.ok_or_else(|| (StatusCode::BAD_REQUEST, Json(error_response("No file provided"))))?;
    Ok((file_name, bytes))
}

async fn preview_csv(multipart: Multipart) -> Result<Json<PreviewResponse>, ApiFailure> {
    let (file_name, bytes) = read_upload(multipart).await?;
    log_info(format!(
        "📄 Preview: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let outcome = parse_employees_bytes(&bytes);
    log_info(outcome.summary());
    Ok(Json(PreviewResponse::from(outcome)))
}

async fn import_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiFailure> {
    let api = state.api_for(&headers)?;
    let (file_name, bytes) = read_upload(multipart).await?;
    log_info(format!(
        "📄 Import: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let outcome = parse_employees_bytes(&bytes);
    log_info(outcome.summary());

    if outcome.rows.is_empty() {
        let message = outcome
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "no employee rows found".to_string());
        let mut body = error_response(&message);
        body["parseErrors"] = json!(outcome.errors);
        return Err((StatusCode::UNPROCESSABLE_ENTITY, Json(body)));
    }

    let report = import_employees(api.as_ref(), &outcome.rows, None, None).await;
    Ok(Json(ImportResponse::new(outcome.errors, outcome.rows.len(), report)))
}
