//! Document upload endpoint.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use idguard_core::{ImageInput, WorkflowStatus};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::server::GatewayState;

const FILE_FIELD: &str = "file";

/// HTTP status for a finished run.
pub fn status_code(status: WorkflowStatus) -> StatusCode {
    match status {
        WorkflowStatus::Legitimate | WorkflowStatus::FraudSuspected => StatusCode::OK,
        WorkflowStatus::ExtractionFailed => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowStatus::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (code, Json(json!({ "error": message.into() }))).into_response()
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, without leading dots.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

async fn keep_upload(dir: &Path, image: &ImageInput) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let name = format!(
        "{}_{}",
        uuid::Uuid::new_v4(),
        sanitize_filename(image.filename.as_deref().unwrap_or("upload"))
    );
    let path = dir.join(name);
    tokio::fs::write(&path, &image.bytes).await?;
    Ok(path)
}

/// Handler for `POST /upload` (multipart, field `file`).
pub async fn upload_document(State(state): State<GatewayState>, mut multipart: Multipart) -> Response {
    let mut image: Option<ImageInput> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(FILE_FIELD) || image.is_some() {
                    continue;
                }
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => return error_response(e.status(), e.body_text()),
                };
                let mut input = ImageInput::new(bytes.to_vec());
                input.filename = filename;
                input.content_type = content_type;
                image = Some(input);
            }
            Ok(None) => break,
            Err(e) => return error_response(e.status(), e.body_text()),
        }
    }

    let Some(image) = image else {
        return error_response(StatusCode::BAD_REQUEST, "No file part in the request");
    };
    if image.bytes.is_empty() || image.filename.as_deref().map(str::is_empty).unwrap_or(false) {
        return error_response(StatusCode::BAD_REQUEST, "No file selected");
    }
    info!(
        size = image.bytes.len(),
        content_type = image.content_type.as_deref().unwrap_or("-"),
        "Upload received"
    );

    if let Some(dir) = &state.uploads.keep_dir {
        match keep_upload(dir, &image).await {
            Ok(path) => info!(path = %path.display(), "Upload kept"),
            Err(e) => warn!(error = %e, "Could not keep upload"),
        }
    }

    let result = state.orchestrator.run(image).await;
    (status_code(result.status), Json(result)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{build_router, GatewayState, UploadSettings};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use idguard_core::{ExtractionError, Extractor, IdentityRecord};
    use idguard_notify::LogNotifier;
    use idguard_store::InMemoryRecordStore;
    use idguard_workflow::Orchestrator;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "idguard-test-boundary";

    /// Reads "ID|NAME" out of the upload body.
    struct TextExtractor;

    #[async_trait]
    impl Extractor for TextExtractor {
        fn name(&self) -> &str {
            "text"
        }

        async fn extract(&self, image: &ImageInput) -> Result<IdentityRecord, ExtractionError> {
            let text = String::from_utf8_lossy(&image.bytes).to_string();
            let (id, name) = text
                .split_once('|')
                .ok_or_else(|| ExtractionError::Malformed("no separator".into()))?;
            IdentityRecord::new(
                id,
                name,
                chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            )
        }
    }

    fn app_with(uploads: UploadSettings) -> axum::Router {
        let orchestrator = Orchestrator::new(
            Arc::new(TextExtractor),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(LogNotifier::default()),
        );
        build_router(GatewayState::new(Arc::new(orchestrator), uploads))
    }

    fn app() -> axum::Router {
        app_with(UploadSettings::default())
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn sanitizes_client_file_names() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my card (1).png"), "my_card__1_.png");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename("C:\\scans\\ktp.jpg"), "ktp.jpg");
    }

    #[test]
    fn maps_statuses_to_http_codes() {
        assert_eq!(status_code(WorkflowStatus::Legitimate), StatusCode::OK);
        assert_eq!(status_code(WorkflowStatus::FraudSuspected), StatusCode::OK);
        assert_eq!(
            status_code(WorkflowStatus::ExtractionFailed),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_code(WorkflowStatus::InternalError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn upload_then_resubmit_is_flagged() {
        let app = app();

        let first = app
            .clone()
            .oneshot(multipart_request("file", "card.png", b"X123|Jane Doe"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(json_body(first).await["status"], "legitimate");

        let second = app
            .oneshot(multipart_request("file", "card.png", b"X123|Jane Doe"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        let body = json_body(second).await;
        assert_eq!(body["status"], "fraud_suspected");
        assert_eq!(body["matched"]["id_number"], "X123");
    }

    #[tokio::test]
    async fn unreadable_document_is_422() {
        let response = app()
            .oneshot(multipart_request("file", "card.png", b"garbage"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["status"], "extraction_failed");
    }

    #[tokio::test]
    async fn missing_file_field_is_400() {
        let response = app()
            .oneshot(multipart_request("document", "card.png", b"X1|A"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn empty_file_is_400() {
        let response = app()
            .oneshot(multipart_request("file", "card.png", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn kept_uploads_land_in_the_configured_dir() {
        let dir = std::env::temp_dir().join(format!("idguard-uploads-{}", uuid::Uuid::new_v4()));
        let app = app_with(UploadSettings {
            keep_dir: Some(dir.clone()),
            ..Default::default()
        });
        let response = app
            .oneshot(multipart_request("file", "my card.png", b"K1|Kept"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("_my_card.png"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn health_and_records_reflect_the_store() {
        let app = app();
        app.clone()
            .oneshot(multipart_request("file", "a.png", b"A1|Alpha"))
            .await
            .unwrap();

        let health = app
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        let body = json_body(health).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["records"], 1);

        let records = app
            .oneshot(
                Request::get("/api/records?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(records).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["records"][0]["record"]["full_name"], "Alpha");
    }

    #[tokio::test]
    async fn records_listing_masks_identity_numbers() {
        let app = app();
        app.clone()
            .oneshot(multipart_request("file", "a.png", b"3171234567890001|Jane Doe"))
            .await
            .unwrap();

        let records = app
            .oneshot(Request::get("/api/records").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(records.status(), StatusCode::OK);
        let body = json_body(records).await;
        assert!(!body.to_string().contains("3171234567890001"));
        assert_eq!(body["records"][0]["record"]["id_number"], "************0001");
    }

    #[tokio::test]
    async fn index_serves_the_upload_form() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("name=\"file\""));
    }
}
