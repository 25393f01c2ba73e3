use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use image_uploader::config::UploaderConfig;
use image_uploader::infrastructure::storage::StorageHandle;
use image_uploader::services::memory::MemoryObjectStore;
use image_uploader::services::storage::ObjectStore;
use image_uploader::{AppState, create_app};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "X-IMAGE-UPLOADER-BOUNDARY";
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

struct BrokenStore;

#[async_trait::async_trait]
impl ObjectStore for BrokenStore {
    async fn store(&self, _key: &str, _data: bytes::Bytes, _ct: &str) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("quota exceeded"))
    }

    async fn public_url(&self, _key: &str) -> anyhow::Result<String> {
        unreachable!("URL resolution must not run after a failed store")
    }

    fn bucket(&self) -> &str {
        "broken"
    }

    async fn health_check(&self) -> bool {
        false
    }
}

fn memory_app() -> (Router, Arc<MemoryObjectStore>) {
    let config = UploaderConfig::development();
    let store = Arc::new(MemoryObjectStore::new(
        config.bucket.clone(),
        "http://localhost:3000/objects",
    ));
    let state = AppState::new(
        StorageHandle {
            store: store.clone(),
            memory: Some(store.clone()),
        },
        config,
    );
    (create_app(state), store)
}

fn broken_app() -> Router {
    let state = AppState::new(
        StorageHandle {
            store: Arc::new(BrokenStore),
            memory: None,
        },
        UploaderConfig::development(),
    );
    create_app(state)
}

fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn select_request(uri: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(filename, content_type, data)))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_select_and_upload_image() {
    let (app, store) = memory_app();

    let response = app
        .clone()
        .oneshot(select_request("/session/file", "cat.png", "image/png", PNG))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = json(response).await;
    assert_eq!(session["status"], "idle");
    assert_eq!(session["file_name"], "cat.png");
    assert_eq!(session["is_image"], true);
    assert!(
        session["preview_url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    assert!(store.is_empty());

    let response = app.clone().oneshot(post("/session/upload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    let url = "http://localhost:3000/objects/image_uploader/cat.png";
    assert_eq!(body["outcome"], "succeeded");
    assert_eq!(body["public_url"], url);
    assert_eq!(body["session"]["status"], "succeeded");
    assert_eq!(body["session"]["preview_url"], url);
    assert_eq!(body["session"]["object_key"], "cat.png");
    assert!(body["session"]["error_message"].is_null());

    // The in-memory bucket serves the object at its public URL path
    let response = app
        .clone()
        .oneshot(get("/objects/image_uploader/cat.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], PNG);
}

#[tokio::test]
async fn test_upload_without_selection_is_skipped() {
    let (app, store) = memory_app();

    let response = app.clone().oneshot(post("/session/upload")).await.unwrap();
    let body = json(response).await;
    assert_eq!(body["outcome"], "skipped_no_file");
    assert_eq!(body["session"]["status"], "idle");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_store_failure_is_reported_verbatim() {
    let app = broken_app();

    app.clone()
        .oneshot(select_request("/session/file", "a.pdf", "application/pdf", b"%PDF"))
        .await
        .unwrap();

    let body = json(app.clone().oneshot(post("/session/upload")).await.unwrap()).await;
    assert_eq!(body["outcome"], "failed");
    assert_eq!(body["error"], "Upload error: quota exceeded");
    assert_eq!(body["session"]["status"], "failed");
    assert_eq!(body["session"]["error_message"], "Upload error: quota exceeded");
    assert_eq!(body["session"]["can_upload"], true);

    let page = text(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert!(page.contains("Upload error: quota exceeded"));
}

#[tokio::test]
async fn test_select_without_file_field_is_rejected() {
    let (app, _store) = memory_app();

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/session/file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["error"], "No file found in request");
}

#[tokio::test]
async fn test_oversized_file_is_rejected() {
    let mut config = UploaderConfig::development();
    config.max_file_size = 4;
    let store = Arc::new(MemoryObjectStore::new(config.bucket.clone(), "http://x"));
    let app = create_app(AppState::new(
        StorageHandle {
            store,
            memory: None,
        },
        config,
    ));

    let response = app
        .oneshot(select_request("/session/file", "cat.png", "image/png", PNG))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_large_image_preview_is_served_from_session() {
    let (app, _store) = memory_app();
    let mut data = PNG.to_vec();
    data.resize(1024 * 1024, 7);

    let response = app
        .clone()
        .oneshot(select_request("/session/file", "big.png", "image/png", &data))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = json(response).await;
    let preview = session["preview_url"].as_str().unwrap().to_string();
    assert!(preview.starts_with("/session/preview?id="));

    let response = app.clone().oneshot(get(&preview)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.len(), data.len());

    // Snapshots stay small even though the selection is large
    let snapshot = text(app.clone().oneshot(get("/session")).await.unwrap()).await;
    assert!(snapshot.len() < 4096);

    // Once uploaded the preview is the public URL and the local route is gone
    app.clone().oneshot(post("/session/upload")).await.unwrap();
    let response = app.clone().oneshot(get(&preview)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let mut config = UploaderConfig::development();
    config.max_file_size = 4;
    let store = Arc::new(MemoryObjectStore::new(config.bucket.clone(), "http://x"));
    let app = create_app(AppState::new(
        StorageHandle {
            store,
            memory: None,
        },
        config,
    ));

    let data = vec![0u8; 2 * 1024 * 1024];
    let response = app
        .oneshot(select_request("/session/file", "big.bin", "application/octet-stream", &data))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_page_flow_with_redirects_and_celebration() {
    let (app, _store) = memory_app();

    let page = text(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert!(page.contains("Upload Your File"));
    assert!(!page.contains("class=\"preview\""));

    let response = app
        .clone()
        .oneshot(select_request("/select", "cat.png", "image/png", PNG))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let page = text(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert!(page.contains(r#"<img class="preview" src="data:image/png;base64,"#));

    let response = app.clone().oneshot(post("/upload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = text(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert!(page.contains("Access your file"));
    assert!(page.contains("http://localhost:3000/objects/image_uploader/cat.png"));
    assert!(page.contains("class=\"confetti\""));

    // The celebration is one-shot
    let page = text(app.clone().oneshot(get("/")).await.unwrap()).await;
    assert!(page.contains("Access your file"));
    assert!(!page.contains("class=\"confetti\""));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let (app, _store) = memory_app();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "connected");
    assert_eq!(body["bucket"], "image_uploader");

    let body = json(broken_app().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(body["storage"], "disconnected");
}

#[tokio::test]
async fn test_unknown_object_is_not_found() {
    let (app, _store) = memory_app();
    let response = app
        .oneshot(get("/objects/image_uploader/missing.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
