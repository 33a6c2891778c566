//! # camwatch-web
//!
//! 로컬 웹 프록시 서버.
//! Axum 기반 REST API — 브라우저 클라이언트가 API 키 없이
//! 비전 분석을 쓸 수 있게 중계한다.
//!
//! ## 기능
//! - 분석 프록시 (체인/단발, 키는 서버에서만 부착)
//! - 클라이언트별 쓰로틀
//! - 분석 히스토리 조회/삭제/CSV 내보내기
//! - 엔진(자동 반복) 제어

pub mod error;
pub mod handlers;
pub mod routes;
pub mod throttle;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use camwatch_core::config::WebConfig;
use camwatch_core::ports::completion::CompletionProvider;
use camwatch_engine::ChainOrchestrator;

pub use throttle::Throttle;

/// CORS preflight 캐시 기간 (초)
const CORS_MAX_AGE_SECS: u64 = 86_400;

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 업스트림 완성 제공자 (프록시 모드에서 직접 호출)
    pub provider: Arc<dyn CompletionProvider>,
    /// 분석 체인 오케스트레이터 (엔진 모드)
    pub orchestrator: Arc<ChainOrchestrator>,
    /// 클라이언트별 쓰로틀
    pub throttle: Arc<Throttle>,
    /// 자동 반복 기본 간격 (초)
    pub default_interval_secs: u64,
}

/// 전체 라우터 구성 — 테스트에서도 이 함수로 앱을 만든다
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS));

    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 로컬 웹 프록시 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    /// 새 웹 서버 생성
    pub fn new(
        config: WebConfig,
        provider: Arc<dyn CompletionProvider>,
        orchestrator: Arc<ChainOrchestrator>,
        default_interval_secs: u64,
    ) -> Self {
        let throttle = Arc::new(Throttle::new(
            config.throttle_enabled,
            config.throttle_secs,
        ));
        Self {
            config,
            state: AppState {
                provider,
                orchestrator,
                throttle,
                default_interval_secs,
            },
        }
    }

    /// 서버 실행.
    ///
    /// 기본 포트에서 시작하고, 사용 중이면 다음 포트를 시도한다.
    /// 최대 10개 포트 시도 후 실패하면 에러 반환.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let app = app(self.state);

        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            let port = base_port.saturating_add(attempt);
            if port < base_port && attempt > 0 {
                break;
            }

            let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {}:{} — {}", host, port, e);
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {} 사용 불가, 대체 포트 {} 사용", base_port, port);
                    }
                    info!("웹 프록시 서버 시작: http://{}", addr);

                    let mut shutdown_rx = shutdown_rx.clone();
                    axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            loop {
                                if *shutdown_rx.borrow() {
                                    info!("웹 서버 종료 신호 수신");
                                    break;
                                }
                                if shutdown_rx.changed().await.is_err() {
                                    break;
                                }
                            }
                        })
                        .await?;

                    info!("웹 프록시 서버 종료");
                    return Ok(());
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::AddrInUse {
                        warn!("포트 {} 이미 사용 중, 다음 포트 시도...", port);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WebConfig::default();
        assert_eq!(config.port, 9090);
        assert!(!config.allow_external);
        assert!(config.throttle_enabled);
        assert_eq!(config.throttle_secs, 20);
    }

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn max_port_attempts_is_reasonable() {
        assert!(MAX_PORT_ATTEMPTS >= 1);
        assert!(MAX_PORT_ATTEMPTS <= 100);
    }

    #[test]
    fn port_overflow_protection() {
        let base_port: u16 = 65530;
        for attempt in 0..MAX_PORT_ATTEMPTS {
            let port = base_port.saturating_add(attempt);
            assert!(port >= base_port || port == u16::MAX);
        }
    }
}
