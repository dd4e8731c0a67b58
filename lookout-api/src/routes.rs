//! API Routes

use std::path::Path as FsPath;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::spawn_blocking;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use lookout_detection::InputKind;
use lookout_engine::{analyze, store_upload, StatusSnapshot};

use crate::error::{ApiError, Result, INVALID_FILE_TYPE};
use crate::state::ApiState;

/// Rows echoed back as `data_preview`.
const PREVIEW_ROWS: usize = 10;

/// Create API router
pub fn router(state: ApiState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        // Service
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        // One-shot analysis
        .route("/predict", post(predict))
        .route("/predict_pcap", post(predict))
        .route("/analyze_pcap", post(predict))
        .route("/download/:filename", get(download))
        // Live capture
        .route("/start_live", post(start_live))
        .route("/stop_live", post(stop_live))
        .route("/live_status", get(live_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "running",
        "service": "Lookout IDS API",
        "endpoints": {
            "predict": "/predict",
            "download": "/download/{filename}",
            "start_live": "/start_live",
            "stop_live": "/stop_live",
            "live_status": "/live_status",
            "health": "/health",
            "metrics": "/metrics"
        }
    }))
}

async fn health() -> Json<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    Json(json!({ "status": "healthy", "timestamp": timestamp }))
}

async fn metrics(State(state): State<ApiState>) -> Result<Response> {
    let body = state
        .metrics
        .gather_metrics()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

async fn start_live(State(state): State<ApiState>) -> Result<Json<Value>> {
    state.supervisor.start()?;
    Ok(Json(json!({ "status": "live_capture_started" })))
}

async fn stop_live(State(state): State<ApiState>) -> Json<Value> {
    state.supervisor.stop().await;
    Json(json!({ "status": "live_capture_stopped" }))
}

async fn live_status(State(state): State<ApiState>) -> Result<Json<StatusSnapshot>> {
    let reader = state.status.clone();
    let snapshot = spawn_blocking(move || reader.read()).await?;
    Ok(Json(snapshot))
}

async fn predict(State(state): State<ApiState>, mut multipart: Multipart) -> Result<Json<Value>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            upload = Some((name, data));
            break;
        }
    }
    let (name, data) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing multipart field `file`".into()))?;

    let kind = InputKind::from_path(FsPath::new(&name))
        .ok_or_else(|| ApiError::BadRequest(INVALID_FILE_TYPE.into()))?;
    info!(filename = %name, bytes = data.len(), "Received upload");

    let (upload_dir, output_dir, pipeline) = (
        state.upload_dir.clone(),
        state.output_dir.clone(),
        state.pipeline.clone(),
    );
    let (saved, analysis) = spawn_blocking(move || {
        let saved = store_upload(&upload_dir, &name, &data)?;
        let analysis = analyze(pipeline.as_ref(), &saved, &output_dir)?;
        Ok::<_, ApiError>((saved, analysis))
    })
    .await??;

    let file_name = saved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_size = tokio::fs::metadata(&saved).await.map(|m| m.len()).unwrap_or(0);

    Ok(Json(json!({
        "status": "success",
        "uploaded_file_path": saved.display().to_string(),
        "file_type": kind.as_str(),
        "filename": file_name,
        "file_size_bytes": file_size,
        "total_flows": analysis.summary.flows,
        "summary": analysis.summary.summary,
        "attack_types": analysis.summary.attack_types,
        "download_csv": analysis.output.display().to_string(),
        "data_preview": analysis.table.preview(PREVIEW_ROWS),
        "all_flows": analysis.table.records(),
    })))
}

async fn download(State(state): State<ApiState>, Path(filename): Path<String>) -> Result<Response> {
    let not_found = || ApiError::NotFound("File not found".into());
    if filename.is_empty() || filename.contains(['/', '\\']) || filename.contains("..") {
        return Err(not_found());
    }

    let path = state.output_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
