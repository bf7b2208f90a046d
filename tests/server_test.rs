use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sales_leads::config::AppConfig;
use sales_leads::server::{create_server, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "leads-boundary";

fn app(tmp: &TempDir) -> Router {
    let mut config = AppConfig::default();
    config.upload.dir = tmp.path().join("uploads");
    config.generation.pause_ms = 0;
    create_server(AppState::from_config(config))
}

fn multipart_request(file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    hyper::body::to_bytes(response.into_body()).await.unwrap().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn upload(app: &Router, file_name: &str, content: &[u8]) -> String {
    let response = app.clone().oneshot(multipart_request(file_name, content)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["file_name"], file_name);
    body["file_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_root() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let health = body_json(app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["status"], "healthy");

    let root = app.oneshot(get("/")).await.unwrap();
    assert_eq!(root.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_process_stream_export() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let csv = "企業名,業種,電話\nA社,IT,03-1111-2222\nB社,小売,06-3333-4444\n";
    let file_id = upload(&app, "leads.csv", csv.as_bytes()).await;

    let response = app
        .clone()
        .oneshot(json_post("/api/process", json!({ "file_id": file_id })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let processed = body_json(response).await;
    assert_eq!(processed["data"].as_array().unwrap().len(), 2);
    assert_eq!(processed["mapping"]["company_name"], "企業名");
    assert_eq!(processed["data"][0]["phone"], "03-1111-2222");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/sales-text-stream?list_id={file_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    let events: Vec<Value> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).unwrap())
        .collect();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0]["status"], "processing");
    assert_eq!(events[0]["message"], "A社の営業文面を生成中...");
    assert_eq!(events[1]["status"], "result");
    assert_eq!(events[4], json!({ "status": "done" }));

    let response = app
        .oneshot(get(&format!("/api/export?list_id={file_id}&format=csv")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"sales_list_{file_id}.csv\"").as_str()
    );
    let exported = String::from_utf8(body_bytes(response).await).unwrap();
    let mut rows = csv::Reader::from_reader(exported.as_bytes());
    let records: Vec<csv::StringRecord> = rows.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][0], "A社");
    assert!(!records[0][7].is_empty(), "generated text was attached");
}

#[tokio::test]
async fn test_upload_rejects_unsupported_extension() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let response = app.oneshot(multipart_request("notes.txt", b"hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("txt"));
    assert!(!tmp.path().join("uploads").exists());
}

#[tokio::test]
async fn test_process_error_statuses() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let missing = app
        .clone()
        .oneshot(json_post(
            "/api/process",
            json!({ "file_id": "00000000-0000-4000-8000-000000000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(missing).await["error_code"], "file_not_found");

    let file_id = upload(&app, "bad.csv", b"Industry,Revenue\nIT,10\n").await;
    let schema = app
        .clone()
        .oneshot(json_post("/api/process", json!({ "file_id": file_id })))
        .await
        .unwrap();
    assert_eq!(schema.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(schema).await["error_code"], "schema_mismatch");

    let file_id = upload(&app, "blank.csv", "会社名,\nA社,x\n".as_bytes()).await;
    let malformed = app
        .oneshot(json_post("/api/process", json!({ "file_id": file_id })))
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(malformed).await["error_code"], "malformed_input");
}

#[tokio::test]
async fn test_export_defaults_and_bad_format() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let response = app.clone().oneshot(get("/api/export?format=excel")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sales_list_current.xlsx\""
    );

    let response = app.clone().oneshot(get("/api/export?format=pdf")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let data = body_json(app.oneshot(get("/api/test-data")).await.unwrap()).await;
    assert_eq!(data["data"].as_array().unwrap().len(), 2);
    assert_eq!(data["data"][0]["employee_count"], 100);
}

#[tokio::test]
async fn test_export_header_cannot_be_split_by_list_id() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let response = app
        .oneshot(get("/api/export?list_id=a%22%3Bname%3Dx&format=csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sales_list_anamex.csv\""
    );
}

#[tokio::test]
async fn test_malformed_process_body_uses_error_envelope() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let request = Request::builder()
        .method("POST")
        .uri("/api/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"file\": 1"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "invalid_request");

    let wrong_shape = app
        .oneshot(json_post("/api/process", json!({ "id": "x" })))
        .await
        .unwrap();
    assert!(wrong_shape.status().is_client_error());
    assert_eq!(body_json(wrong_shape).await["error_code"], "invalid_request");
}
