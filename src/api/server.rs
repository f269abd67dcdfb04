//! HTTP server implementation for the API

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::models::{attachment_disposition, CategoryList, ErrorResponse, UploadRequest};
use crate::config::Config;
use crate::pipeline::{HighlightError, HighlightPipeline};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<HighlightPipeline>,
    pub config: Arc<Config>,
}

/// Configure and start the HTTP server
pub async fn start_http_server(pipeline: Arc<HighlightPipeline>, config: Arc<Config>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let max_upload_bytes = config.server.max_upload_mb * 1024 * 1024;

    let app_state = AppState { pipeline, config };

    // Configure CORS to allow browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/categories", get(categories_handler))
        .route("/upload", post(upload_handler))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sports-highlighter",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// List available sport categories
async fn categories_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(CategoryList {
        categories: state.pipeline.lexicon().categories(),
    })
}

/// Upload handler: video in, assembled highlight clip out
async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request = match read_upload(multipart).await {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    if !request.has_file() {
        return error_response(&HighlightError::NoFileProvided);
    }

    match process_upload(&state, request).await {
        Ok((download_name, bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "video/mp4".to_string()),
                (header::CONTENT_DISPOSITION, attachment_disposition(&download_name)),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!("Upload processing failed: {}", e);
            error_response(&e)
        }
    }
}

/// Parse the multipart form fields
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, HighlightError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HighlightError::Processing(anyhow::anyhow!("Malformed upload: {}", e)))?
    {
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("file") => {
                request.file_name = field.file_name().map(String::from);
                request.file_bytes = field
                    .bytes()
                    .await
                    .map_err(|_| HighlightError::NoFileProvided)?
                    .to_vec();
            }
            Some("sport_type") => {
                if let Ok(value) = field.text().await {
                    request.sport_type = Some(value);
                }
            }
            Some("selected_moment") => {
                if let Ok(value) = field.text().await {
                    request.selected_moment = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

/// Save the upload into a temp file, run the pipeline, and read back the
/// assembled clip. The uploaded source is deleted when this returns,
/// success or failure.
async fn process_upload(
    state: &AppState,
    request: UploadRequest,
) -> Result<(String, Vec<u8>), HighlightError> {
    let source = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(".mp4")
        .tempfile()
        .context("Failed to create upload temp file")
        .map_err(HighlightError::Processing)?;

    tokio::fs::write(source.path(), &request.file_bytes)
        .await
        .context("Failed to save uploaded video")
        .map_err(HighlightError::Processing)?;

    let clip = state
        .pipeline
        .run(
            source.path(),
            request.category(),
            request.selected_moment.as_deref(),
        )
        .await?;

    let bytes = clip.read_bytes().await?;
    Ok((clip.download_name.clone(), bytes))
}

fn error_response(error: &HighlightError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

/// Minimal info page; the real upload UI lives outside this service
async fn index_handler() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html>
<head><title>Sports Highlighter API</title></head>
<body>
    <h1>Sports Highlighter API</h1>
    <p>POST a multipart form to <code>/upload</code> with fields
    <code>file</code>, <code>sport_type</code> and optional
    <code>selected_moment</code> to receive the assembled highlight clip.</p>
    <p><code>GET /api/categories</code> lists the supported sports.</p>
</body>
</html>
"#;
    (StatusCode::OK, [("content-type", "text/html")], html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status_mapping() {
        let response = error_response(&HighlightError::NoFileProvided);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(&HighlightError::NoHighlightsFound);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = error_response(&HighlightError::Processing(anyhow::anyhow!("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
