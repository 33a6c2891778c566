//! 클라이언트별 요청 쓰로틀.
//!
//! 분석 요청은 업스트림 비용이 크므로 클라이언트당 윈도우 내 1회만
//! 허용한다. 클라이언트 식별은 `x-forwarded-for`의 첫 항목,
//! 없으면 직결 클라이언트로 간주한다.
//!
//! 거부 응답은 남은 대기 시간을 소수 첫째 자리까지 포함한다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// `x-forwarded-for` 부재 시 사용하는 클라이언트 키
const DIRECT_CLIENT_KEY: &str = "local";

/// 클라이언트별 쓰로틀 상태
#[derive(Debug)]
pub struct Throttle {
    enabled: bool,
    window: Duration,
    /// 클라이언트 키 → 마지막 허용 시각
    last_allowed: Mutex<HashMap<String, Instant>>,
}

impl Throttle {
    /// 새 쓰로틀 생성
    pub fn new(enabled: bool, window_secs: u64) -> Self {
        Self {
            enabled,
            window: Duration::from_secs(window_secs),
            last_allowed: Mutex::new(HashMap::new()),
        }
    }

    /// 요청 허용 여부 판정.
    ///
    /// 허용 시 해당 클라이언트의 윈도우를 갱신한다.
    /// 거부 시 남은 대기 시간을 반환한다.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        if !self.enabled {
            return Ok(());
        }

        let now = Instant::now();
        let mut last_allowed = self.last_allowed.lock();

        if let Some(last) = last_allowed.get(client) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.window {
                return Err(self.window - elapsed);
            }
        }

        // 윈도우를 벗어난 항목은 더 이상 판정에 쓰이지 않으므로 여기서 정리
        last_allowed.retain(|_, last| now.duration_since(*last) < self.window);
        last_allowed.insert(client.to_string(), now);
        Ok(())
    }
}

/// 요청 헤더에서 클라이언트 키 추출.
///
/// `x-forwarded-for`는 쉼표 구분 목록이며 첫 항목이 원 클라이언트다.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DIRECT_CLIENT_KEY.to_string())
}

/// 쓰로틀 미들웨어 — 분석 라우트에만 걸린다
pub async fn throttle_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(request.headers());

    if let Err(remaining) = state.throttle.check(&client) {
        debug!(client = %client, remaining_secs = remaining.as_secs_f64(), "쓰로틀 거부");
        return Err(ApiError::Throttled(format!(
            "Too many requests. Please wait {:.1}s.",
            remaining.as_secs_f64()
        )));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn first_request_passes_second_is_rejected() {
        let throttle = Throttle::new(true, 20);
        assert!(throttle.check("1.2.3.4").is_ok());

        let remaining = throttle.check("1.2.3.4").unwrap_err();
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= Duration::from_secs(20));
    }

    #[test]
    fn clients_are_independent() {
        let throttle = Throttle::new(true, 20);
        assert!(throttle.check("1.2.3.4").is_ok());
        assert!(throttle.check("5.6.7.8").is_ok());
    }

    #[test]
    fn disabled_throttle_always_passes() {
        let throttle = Throttle::new(false, 20);
        assert!(throttle.check("1.2.3.4").is_ok());
        assert!(throttle.check("1.2.3.4").is_ok());
    }

    #[test]
    fn expired_entries_are_evicted_on_admit() {
        // 윈도우 0초면 모든 항목이 즉시 만료 — 허용 시점마다 정리된다
        let throttle = Throttle::new(true, 0);
        assert!(throttle.check("1.2.3.4").is_ok());
        assert!(throttle.check("5.6.7.8").is_ok());
        assert_eq!(throttle.last_allowed.lock().len(), 1);
    }

    #[test]
    fn forwarded_for_uses_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("9.9.9.9, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "9.9.9.9");
    }

    #[test]
    fn missing_header_falls_back_to_direct() {
        assert_eq!(client_key(&HeaderMap::new()), DIRECT_CLIENT_KEY);
    }
}
