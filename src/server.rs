use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures::{Stream, StreamExt};
use hyper::Server;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, info_span, warn, Instrument};

use crate::app::ports::RecordStore;
use crate::app::{stream_outreach, OutreachWriter};
use crate::config::AppConfig;
use crate::error::{ErrorKind, ExportError, IngestError, StoreError, UploadError};
use crate::export::{export_list, ExportFormat};
use crate::gateway::uploads::UploadStore;
use crate::pipeline::storage::{InMemoryRecordStore, SampleRecordStore, CURRENT_LIST};
use crate::pipeline::Ingestor;
use crate::types::IngestOutcome;

/// Headroom above the configured file size for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ingestor: Arc<Ingestor>,
    pub uploads: Arc<UploadStore>,
    pub store: Arc<InMemoryRecordStore>,
    pub writer: Arc<OutreachWriter>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Self {
        let writer = OutreachWriter::from_config(&config.generation);
        info!("Text generation backend: {}", writer.backend_name());
        Self {
            ingestor: Arc::new(Ingestor::new(&config.ingest)),
            uploads: Arc::new(UploadStore::new(config.upload.clone())),
            store: Arc::new(InMemoryRecordStore::new(Arc::new(SampleRecordStore))),
            writer: Arc::new(writer),
            config: Arc::new(config),
        }
    }
}

/// JSON error body: `{"success": false, "error": ..., "error_code": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
            "error_code": self.code,
        }));
        (self.status, body).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => ApiError::new(StatusCode::NOT_FOUND, "file_not_found", err.to_string()),
            ErrorKind::Malformed => ApiError::new(StatusCode::BAD_REQUEST, "malformed_input", err.to_string()),
            ErrorKind::Schema => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "schema_mismatch", err.to_string())
            }
            ErrorKind::Internal => {
                error!("Ingestion failed: {}", err);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    format!("データ処理中にエラーが発生しました: {err}"),
                )
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(e) => {
                error!("Failed to persist upload: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string())
            }
            other => ApiError::new(StatusCode::BAD_REQUEST, "invalid_upload", other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnsupportedFormat(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "unsupported_format", err.to_string())
            }
            other => {
                error!("Export failed: {}", other);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), "invalid_request", rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!("Record store failed: {}", err);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string())
    }
}

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "営業リスト処理APIへようこそ" }))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "sales_leads",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file_id: String,
    pub file_name: String,
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let bad_request = |msg: String| ApiError::new(StatusCode::BAD_REQUEST, "invalid_upload", msg);

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_request(e.to_string()))? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string).ok_or(UploadError::MissingFileName)?;
        // Reject on the name before reading the body
        state.uploads.validate(&file_name, None)?;
        let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
        let stored = state.uploads.save(&file_name, &bytes).await?;
        return Ok(Json(UploadResponse {
            success: true,
            file_id: stored.file_id,
            file_name: stored.file_name,
        }));
    }
    Err(bad_request("multipart field 'file' is required".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub file_id: String,
}

async fn process(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let Json(req) = payload?;
    let span = info_span!("ingest", file_id = %req.file_id);
    let outcome = state
        .ingestor
        .ingest_file(&state.uploads, &req.file_id)
        .instrument(span)
        .await
        .map_err(|e| {
            warn!("Processing {} failed: {}", req.file_id, e);
            e
        })?;
    state.store.put(&req.file_id, outcome.data.clone())?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub list_id: Option<String>,
    pub format: Option<String>,
}

impl ListParams {
    fn list_id(&self) -> String {
        self.list_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| CURRENT_LIST.to_string())
    }
}

async fn sales_text_stream(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Sse<impl Stream<Item = Result<Event, serde_json::Error>>> {
    let store: Arc<dyn RecordStore> = state.store.clone();
    let events = stream_outreach(
        store,
        state.writer.clone(),
        params.list_id(),
        Duration::from_millis(state.config.generation.pause_ms),
    )
    .map(|event| Event::default().json_data(event));
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn export(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = params.format.as_deref().unwrap_or("csv").parse()?;
    let file = export_list(state.store.as_ref(), &params.list_id(), format).await?;
    let disposition = format!("attachment; filename=\"{}\"", attachment_name(&file.file_name));
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// Keeps only characters that cannot end or split a quoted header parameter.
fn attachment_name(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

async fn test_data() -> impl IntoResponse {
    Json(json!({ "data": SampleRecordStore::records_for(CURRENT_LIST) }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Create the HTTP server with all routes
pub fn create_server(state: AppState) -> Router {
    let body_limit = state.config.upload.max_file_size as usize + MULTIPART_OVERHEAD;
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/process", post(process))
        .route("/api/sales-text-stream", get(sales_text_stream))
        .route("/api/export", get(export))
        .route("/api/test-data", get(test_data))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the configured address
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let port = addr.port();
    let app = create_server(state);

    info!("HTTP server listening on {}", addr);
    println!("🚀 HTTP server running on http://localhost:{port}");
    println!("💚 Health check: http://localhost:{port}/health");

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name_strips_parameter_syntax() {
        assert_eq!(attachment_name("sales_list_current.csv"), "sales_list_current.csv");
        assert_eq!(
            attachment_name("sales_list_a\";name=x;b.csv"),
            "sales_list_anamexb.csv"
        );
        assert_eq!(attachment_name("sales_list_../\r\nX: y.xlsx"), "sales_list_..Xy.xlsx");
    }
}
