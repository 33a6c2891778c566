//! API 에러 처리.
//!
//! 코어 에러를 HTTP 상태로 사상한다. 업스트림 비정상 응답은
//! 상태 코드를 그대로 전달한다 (프록시 의미 보존).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use camwatch_core::error::CoreError;

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청 (유효성 검증 실패 포함)
    #[error("잘못된 요청: {0}")]
    BadRequest(String),

    /// 업스트림 비정상 응답 — 상태 코드 그대로 전달
    #[error("업스트림 에러 ({status}): {message}")]
    Upstream {
        /// 업스트림이 반환한 HTTP 상태
        status: u16,
        /// 업스트림 에러 본문
        message: String,
    },

    /// 분석 사이클이 이미 진행 중
    #[error("분석이 이미 진행 중: {0}")]
    Conflict(String),

    /// 클라이언트 쓰로틀 초과
    #[error("{0}")]
    Throttled(String),

    /// 업스트림 응답 시간 초과
    #[error("업스트림 시간 초과: {0}")]
    GatewayTimeout(String),

    /// 캡처 소스 등 의존 리소스 사용 불가
    #[error("서비스 사용 불가: {0}")]
    Unavailable(String),

    /// 내부 서버 오류
    #[error("내부 서버 오류: {0}")]
    Internal(String),
}

/// 에러 응답 본문 — 프록시 계약: 메시지는 `message` 키로 나간다
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub message: String,
    /// HTTP 상태 코드
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream { status, message } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Throttled(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorResponse {
            message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            // 클라이언트에게는 필드가 아닌 메시지만 노출
            CoreError::Validation { message, .. } => ApiError::BadRequest(message),
            CoreError::Endpoint { status, message } => ApiError::Upstream { status, message },
            CoreError::Timeout => ApiError::GatewayTimeout(err_text(&CoreError::Timeout)),
            CoreError::AlreadyInProgress => {
                ApiError::Conflict(err_text(&CoreError::AlreadyInProgress))
            }
            CoreError::RateLimit { retry_after_ms } => ApiError::Throttled(format!(
                "Too many requests. Please wait {:.1}s.",
                retry_after_ms as f64 / 1000.0
            )),
            CoreError::CaptureUnavailable => {
                ApiError::Unavailable(err_text(&CoreError::CaptureUnavailable))
            }
            CoreError::CaptureFailed(msg) => ApiError::Unavailable(msg),
            CoreError::Config(msg) => ApiError::Internal(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

fn err_text(err: &CoreError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let api: ApiError = CoreError::validation("image", "bad payload").into();
        match api {
            ApiError::BadRequest(msg) => assert_eq!(msg, "bad payload"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn endpoint_status_is_preserved() {
        let api: ApiError = CoreError::Endpoint {
            status: 418,
            message: "teapot".to_string(),
        }
        .into();
        match api {
            ApiError::Upstream { status, .. } => assert_eq!(status, 418),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn busy_maps_to_conflict() {
        let api: ApiError = CoreError::AlreadyInProgress.into();
        assert!(matches!(api, ApiError::Conflict(_)));
    }

    #[test]
    fn rate_limit_message_has_one_decimal() {
        let api: ApiError = CoreError::RateLimit {
            retry_after_ms: 12_345,
        }
        .into();
        match api {
            ApiError::Throttled(msg) => {
                assert_eq!(msg, "Too many requests. Please wait 12.3s.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
