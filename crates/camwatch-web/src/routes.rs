//! API 라우트 정의.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers;
use crate::throttle;
use crate::AppState;

/// API 라우트 생성.
///
/// 쓰로틀은 업스트림 비용이 발생하는 분석 프록시에만 건다.
/// 히스토리/상태 조회는 로컬 연산이므로 제한하지 않는다.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let throttled = Router::new()
        .route("/analyze", post(handlers::analyze::analyze))
        .route_layer(middleware::from_fn_with_state(
            state,
            throttle::throttle_middleware,
        ));

    Router::new()
        .merge(throttled)
        // 히스토리
        .route("/history", get(handlers::history::list_history))
        .route("/history", delete(handlers::history::clear_history))
        .route("/history/export", get(handlers::history::export_history))
        // 엔진 제어
        .route("/engine/analyze", post(handlers::engine::analyze_now))
        .route("/engine/start", post(handlers::engine::start_engine))
        .route("/engine/stop", post(handlers::engine::stop_engine))
        .route("/engine/status", get(handlers::engine::engine_status))
}
