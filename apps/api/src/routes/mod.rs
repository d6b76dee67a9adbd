pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extract::handlers;
use crate::state::AppState;

/// Uploaded résumés are rarely above a few megabytes; scanned ones can be.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/extract", post(handlers::handle_extract))
        .route("/api/v1/extract/batch", post(handlers::handle_extract_batch))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::pipeline::batch::tests::{MemorySink, MemorySource};
    use crate::pipeline::tests::{pipeline_with, CountingOcr, EXPERIENCE_PAGE, IDENTITY_PAGE};
    use crate::pipeline::BatchRunner;

    const BOUNDARY: &str = "cv-etl-boundary";

    fn app() -> Router {
        let pipeline = Arc::new(pipeline_with(
            vec![IDENTITY_PAGE, EXPERIENCE_PAGE],
            Arc::new(CountingOcr::default()),
            Vec::new(),
        ));
        let batch = BatchRunner::new(
            pipeline.clone(),
            Arc::new(MemorySource),
            Arc::new(MemorySink::default()),
            2,
        );
        build_router(AppState {
            pipeline,
            batch: Arc::new(batch),
            config: Config::for_tests(),
        })
    }

    fn multipart(file_name: &str, content_type: &str, body: &[u8]) -> Request<Body> {
        let mut payload = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        payload.extend_from_slice(body);
        payload.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/extract")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(payload))
            .unwrap()
    }

    fn batch_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/extract/batch")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cv-etl-api");
        assert_eq!(body["extractors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_extract_upload_returns_record() {
        let response = app()
            .oneshot(multipart("jean.pdf", "application/pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["metadata"]["source_filename"], "jean.pdf");
        assert_eq!(body["experience"][0]["company"], "TechCorp");
        assert_eq!(body["experience"][0]["tasks"][0], "Managed K8s cluster");
    }

    #[tokio::test]
    async fn test_extract_rejects_unknown_format() {
        let response = app()
            .oneshot(multipart("notes.txt", "text/plain", b"hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_extract_rejects_empty_upload() {
        let response = app()
            .oneshot(multipart("cv.pdf", "application/pdf", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_reports_each_document() {
        let response = app()
            .oneshot(batch_request(r#"{"file_ids": ["a.pdf", "missing.pdf"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["documents"][0]["status"], "ok");
        assert_eq!(body["documents"][0]["record_key"], "extracted/a_extracted.json");
        assert_eq!(body["documents"][1]["status"], "fetch_failed");
    }

    #[tokio::test]
    async fn test_batch_requires_ids() {
        let response = app()
            .oneshot(batch_request(r#"{"file_ids": ["  "]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
