//! Employee API client.
//!
//! [`EmployeeApi`] is the boundary between the import executor and the
//! Podium backend. [`HttpEmployeeApi`] implements it over HTTP with
//! bearer-token auth; tests substitute their own implementations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use onboarding::client::{EmployeeApi, HttpEmployeeApi};
//! use onboarding::config::ClientConfig;
//!
//! let api = HttpEmployeeApi::new(ClientConfig::from_env()?)?;
//! let record = api.create_employee(&payload).await?;
//! ```

pub mod loading;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::{ClientConfig, BATCH_CREATE_PATH, CREATE_EMPLOYEE_PATH, UPLOAD_CHUNK_SIZE};
use crate::error::{ApiError, ApiResult, ConfigError};
use crate::models::{BatchResponse, EmployeePayload, EmployeeRecord};

pub use loading::{RequestGuard, RequestTracker};

/// Upload progress callback: `(bytes_sent, bytes_total)`.
pub type UploadProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Operations the import executor needs from the backend.
#[async_trait]
pub trait EmployeeApi: Send + Sync {
    /// Create one employee.
    async fn create_employee(&self, payload: &EmployeePayload) -> ApiResult<EmployeeRecord>;

    /// Create many employees in one call.
    ///
    /// Implementations that can observe the upload report it through
    /// `on_upload`; others never call it.
    async fn batch_create_employees(
        &self,
        payloads: &[EmployeePayload],
        on_upload: Option<UploadProgress<'_>>,
    ) -> ApiResult<BatchResponse>;
}

/// HTTP implementation of [`EmployeeApi`].
#[derive(Clone)]
pub struct HttpEmployeeApi {
    http: reqwest::Client,
    config: ClientConfig,
    tracker: RequestTracker,
}

impl HttpEmployeeApi {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            config,
            tracker: RequestTracker::new(),
        })
    }

    /// Share an existing tracker (e.g. one the shell already displays).
    pub fn with_tracker(mut self, tracker: RequestTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.http.post(self.config.endpoint(path));
        match &self.config.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl EmployeeApi for HttpEmployeeApi {
    async fn create_employee(&self, payload: &EmployeePayload) -> ApiResult<EmployeeRecord> {
        let _guard = self.tracker.track();

        let response = self.post(CREATE_EMPLOYEE_PATH).json(payload).send().await?;
        let body = read_success_body(response).await?;

        if body.trim().is_empty() {
            return Ok(EmployeeRecord::default());
        }
        decode(&body)
    }

    async fn batch_create_employees(
        &self,
        payloads: &[EmployeePayload],
        on_upload: Option<UploadProgress<'_>>,
    ) -> ApiResult<BatchResponse> {
        let _guard = self.tracker.track();

        let body = serde_json::to_vec(payloads).map_err(|e| ApiError::Decode(e.to_string()))?;
        let total = body.len();

        // The body stream must be 'static, so it reports through a channel and
        // the borrowed callback is invoked here while the request is driven.
        let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
        let chunks: Vec<Vec<u8>> = body.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent = 0;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len();
            let _ = tx.send(sent);
            Ok::<_, std::io::Error>(chunk)
        }));

        let request = self
            .post(BATCH_CREATE_PATH)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::wrap_stream(stream))
            .send();
        tokio::pin!(request);

        let response = loop {
            tokio::select! {
                Some(sent) = rx.recv() => {
                    if let Some(report) = on_upload {
                        report(sent, total);
                    }
                }
                result = &mut request => break result?,
            }
        };
        while let Ok(sent) = rx.try_recv() {
            if let Some(report) = on_upload {
                report(sent, total);
            }
        }

        let body = read_success_body(response).await?;
        decode(&body)
    }
}

/// Return the body of a 2xx response, or turn anything else into [`ApiError::Status`].
async fn read_success_body(response: Response) -> ApiResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }
    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Best human-readable message for an error response.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}` and
/// `{"message": "..."}`; anything else becomes `HTTP <status>`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        match json.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Array(items)) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(Value::as_str))
                .map(str::to_string),
            _ => json.get("message").and_then(Value::as_str).map(str::to_string),
        }
    });

    from_body
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{import_employees, ImportMode};
    use crate::models::ParsedEmployeeRow;
    use axum::{
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn payload(email: &str) -> EmployeePayload {
        EmployeePayload {
            email: email.into(),
            full_name: "Ana".into(),
            password: "Podium#12345678".into(),
            role: "employee".into(),
            department: "RH".into(),
            cost_center_id: 1,
        }
    }

    async fn create(headers: HeaderMap, Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
            return (AxumStatus::UNAUTHORIZED, Json(json!({ "detail": "Not authenticated" })));
        }
        if body["email"] == "taken@x.com" {
            return (AxumStatus::BAD_REQUEST, Json(json!({ "detail": "Email already registered" })));
        }
        (AxumStatus::CREATED, Json(json!({ "id": 7, "email": body["email"], "role": "employee" })))
    }

    async fn batch(Json(body): Json<Vec<Value>>) -> Json<Value> {
        let results: Vec<Value> = body
            .iter()
            .map(|p| json!({ "email": p["email"], "status": "created" }))
            .collect();
        Json(json!({
            "summary": { "created": results.len(), "conflicts": 0, "errors": 0, "total": results.len() },
            "results": results
        }))
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_create_employee_sends_bearer_token() {
        let base = spawn_server(Router::new().route("/employees", post(create))).await;
        let api = HttpEmployeeApi::new(ClientConfig::new(base).with_token("secret")).unwrap();

        let record = api.create_employee(&payload("ana@x.com")).await.unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.email.as_deref(), Some("ana@x.com"));
        assert!(!api.tracker().is_loading());
    }

    #[tokio::test]
    async fn test_create_employee_error_detail() {
        let base = spawn_server(Router::new().route("/employees", post(create))).await;
        let api = HttpEmployeeApi::new(ClientConfig::new(base.clone()).with_token("secret")).unwrap();

        let err = api.create_employee(&payload("taken@x.com")).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Email already registered");

        let anonymous = HttpEmployeeApi::new(ClientConfig::new(base)).unwrap();
        let err = anonymous.create_employee(&payload("ana@x.com")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_batch_reports_upload_progress() {
        let base = spawn_server(Router::new().route("/users/batch", post(batch))).await;
        let api = HttpEmployeeApi::new(ClientConfig::new(base)).unwrap();

        let payloads: Vec<EmployeePayload> =
            (0..300).map(|i| payload(&format!("user{}@x.com", i))).collect();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let report = move |sent: usize, total: usize| sink.lock().unwrap().push((sent, total));

        let response = api.batch_create_employees(&payloads, Some(&report)).await.unwrap();
        assert_eq!(response.results.len(), 300);
        assert_eq!(response.summary.created, 300);

        let calls = calls.lock().unwrap();
        assert!(calls.len() > 1);
        let (sent, total) = *calls.last().unwrap();
        assert_eq!(sent, total);
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[tokio::test]
    async fn test_batch_missing_endpoint() {
        let base = spawn_server(Router::new().route("/employees", post(create))).await;
        let api = HttpEmployeeApi::new(ClientConfig::new(base)).unwrap();

        let err = api.batch_create_employees(&[payload("a@x.com")], None).await.unwrap_err();
        assert!(err.is_endpoint_missing());
    }

    async fn batch_unavailable() -> (AxumStatus, Json<Value>) {
        (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "database unavailable" })))
    }

    async fn batch_garbled() -> &'static str {
        "not json"
    }

    fn rows() -> Vec<ParsedEmployeeRow> {
        ["ana@x.com", "taken@x.com", "caio@x.com"]
            .iter()
            .enumerate()
            .map(|(i, email)| ParsedEmployeeRow {
                line: i + 2,
                full_name: "Employee".into(),
                email: email.to_string(),
                department: String::new(),
                cost_center_id: 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batch_server_error_falls_back() {
        let router = Router::new()
            .route("/employees", post(create))
            .route("/users/batch", post(batch_unavailable));
        let base = spawn_server(router).await;
        let api = HttpEmployeeApi::new(ClientConfig::new(base).with_token("secret")).unwrap();

        let err = api.batch_create_employees(&[payload("a@x.com")], None).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert_eq!(err.to_string(), "database unavailable");

        let report = import_employees(&api, &rows(), None, None).await;
        assert_eq!(report.mode, ImportMode::Sequential);
        assert_eq!(report.fallback_reason.as_deref(), Some("Batch import failed: database unavailable"));
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.results[1].message.as_deref(), Some("Email already registered"));
    }

    #[tokio::test]
    async fn test_batch_undecodable_body_falls_back() {
        let router = Router::new()
            .route("/employees", post(create))
            .route("/users/batch", post(batch_garbled));
        let base = spawn_server(router).await;
        let api = HttpEmployeeApi::new(ClientConfig::new(base).with_token("secret")).unwrap();

        let err = api.batch_create_employees(&[payload("a@x.com")], None).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));

        let report = import_employees(&api, &rows(), None, None).await;
        assert_eq!(report.mode, ImportMode::Sequential);
        assert_eq!(report.results.len(), 3);
        let lines: Vec<usize> = report.results.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpEmployeeApi::new(ClientConfig::new(format!("http://{}", addr))).unwrap();
        let err = api.create_employee(&payload("a@x.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn test_error_message_shapes() {
        let bad = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(bad, r#"{"detail":"Email already registered"}"#), "Email already registered");
        assert_eq!(
            error_message(bad, r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email"}]}"#),
            "value is not a valid email"
        );
        assert_eq!(error_message(bad, r#"{"message":"nope"}"#), "nope");
        assert_eq!(error_message(StatusCode::NOT_FOUND, "<html>"), "HTTP 404 Not Found");
        assert_eq!(error_message(bad, r#"{"detail":""}"#), "HTTP 400 Bad Request");
    }
}
