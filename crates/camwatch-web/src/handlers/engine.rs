//! 엔진 제어 API 핸들러.
//!
//! 로컬 프레임 소스를 쓰는 오케스트레이터를 웹에서 구동한다.
//! 수동 트리거, 자동 반복 시작/중지, 상태 조회.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use camwatch_core::error::CoreError;
use camwatch_core::models::analysis::{AnalysisResult, Trigger};

use crate::{error::ApiError, AppState};

/// 자동 반복 시작 요청 본문
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBody {
    /// 반복 간격 (초) — 생략 시 설정 기본값, 하한으로 클램프
    pub interval_secs: Option<u64>,
}

/// POST /api/engine/analyze - 수동 사이클 실행
pub async fn analyze_now(
    State(state): State<AppState>,
) -> Result<Json<AnalysisResult>, ApiError> {
    match state.orchestrator.run_cycle(Trigger::Manual).await? {
        Some(result) => Ok(Json(result)),
        // 수동 트리거는 바쁨 시 Err로 돌아오므로 여기 닿지 않는다
        None => Err(CoreError::AlreadyInProgress.into()),
    }
}

/// POST /api/engine/start - 자동 반복 시작
pub async fn start_engine(
    State(state): State<AppState>,
    body: Option<Json<StartBody>>,
) -> Result<Json<Value>, ApiError> {
    let requested = body
        .map(|Json(b)| b.interval_secs)
        .unwrap_or_default()
        .unwrap_or(state.default_interval_secs);

    let interval = state.orchestrator.start_auto(requested);
    info!(requested, interval, "자동 반복 시작 요청");

    Ok(Json(json!({ "running": true, "intervalSecs": interval })))
}

/// POST /api/engine/stop - 자동 반복 중지
pub async fn stop_engine(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let was_running = state.orchestrator.stop_auto();
    info!(was_running, "자동 반복 중지 요청");
    Ok(Json(json!({ "running": false, "wasRunning": was_running })))
}

/// GET /api/engine/status - 엔진 상태 조회
pub async fn engine_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let status = state.orchestrator.status();
    Ok(Json(json!({
        "running": status.running,
        "busy": status.busy,
        "intervalSecs": status.interval_secs,
        "historyLen": state.orchestrator.history().len(),
    })))
}
