//! 히스토리 API 핸들러.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use camwatch_core::models::analysis::AnalysisResult;

use crate::{error::ApiError, AppState};

/// GET /api/history - 분석 기록 조회 (최신순)
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnalysisResult>>, ApiError> {
    Ok(Json(state.orchestrator.history().snapshot()))
}

/// DELETE /api/history - 전체 기록 삭제
pub async fn clear_history(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let history = state.orchestrator.history();
    let cleared = history.len();
    history.clear();
    info!(cleared, "히스토리 삭제");
    Ok(Json(json!({ "cleared": cleared })))
}

/// GET /api/history/export - CSV 다운로드
pub async fn export_history(State(state): State<AppState>) -> Result<Response, ApiError> {
    let csv = state.orchestrator.history().to_csv();
    let filename = format!("camwatch-history-{}.csv", Utc::now().format("%Y%m%d-%H%M%S"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
