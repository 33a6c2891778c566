//! # camwatch-app
//!
//! CAMWATCH 바이너리 진입점.
//! DI 컨테이너 역할 — 어댑터 생성, 오케스트레이터 와이어링, 웹 서버 구동.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use camwatch_core::config_manager::ConfigManager;
use camwatch_core::models::analysis::Trigger;
use camwatch_core::ports::completion::CompletionProvider;
use camwatch_core::ports::frame_source::FrameSource;
use camwatch_engine::{AnalysisHistory, ChainOrchestrator};
use camwatch_network::OpenAiVisionClient;
use camwatch_vision::{ScreenFrameSource, StillFrameSource};
use camwatch_web::WebServer;

/// CAMWATCH — 주기적 프레임 캡처 + 2단계 비전 분석
#[derive(Parser, Debug)]
#[command(name = "camwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 웹 서버 포트 오버라이드
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 자동 반복 간격 오버라이드 (초, 하한으로 클램프)
    #[arg(long, short = 'i')]
    interval: Option<u64>,

    /// 화면 캡처 대신 사용할 정지 이미지 (jpg/png)
    #[arg(long)]
    image: Option<PathBuf>,

    /// 사이클 하나만 실행하고 결과를 JSON으로 출력 후 종료
    #[arg(long)]
    once: bool,

    /// 시작과 동시에 자동 반복 가동
    #[arg(long, short = 'a')]
    auto: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    let log_filter = format!(
        "camwatch={lvl},camwatch_app={lvl},camwatch_core={lvl},camwatch_vision={lvl},camwatch_network={lvl},camwatch_engine={lvl},camwatch_web={lvl}",
        lvl = log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

/// 프레임 소스 선택 — `--image`가 있으면 정지 이미지, 없으면 화면 캡처
fn build_frame_source(
    image: Option<&PathBuf>,
    capture_max_width: u32,
) -> Result<Arc<dyn FrameSource>> {
    match image {
        Some(path) => {
            let source = StillFrameSource::from_path(path)
                .with_context(|| format!("정지 이미지 로드 실패: {}", path.display()))?;
            info!("프레임 소스: 정지 이미지 {}", path.display());
            Ok(Arc::new(source))
        }
        None => {
            let source = ScreenFrameSource::new(capture_max_width);
            if !source.is_ready() {
                warn!("캡처 가능한 모니터가 감지되지 않음 — 사이클 실행 시 에러가 됩니다");
            }
            info!("프레임 소스: 주 모니터 캡처 (최대 너비 {}px)", capture_max_width);
            Ok(Arc::new(source))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("CAMWATCH 시작");

    // 설정 로드
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("설정 로드 실패")?;
    let mut config = config_manager.get();

    // CLI 인자로 설정 오버라이드
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(interval) = args.interval {
        config.engine.default_interval_secs = interval;
    }

    // ── 어댑터 생성 (DI 와이어링) ──

    let provider: Arc<dyn CompletionProvider> = Arc::new(
        OpenAiVisionClient::new(&config.upstream).context("업스트림 클라이언트 생성 실패")?,
    );

    let frame_source = build_frame_source(args.image.as_ref(), config.engine.capture_max_width)?;

    let history = Arc::new(AnalysisHistory::new());
    let orchestrator = Arc::new(ChainOrchestrator::new(
        frame_source,
        Arc::clone(&provider),
        history,
        config.engine.primary_prompt.clone(),
        config.engine.secondary_prompt.clone(),
        config.engine.min_interval_secs,
    ));

    // 단발 모드: 사이클 하나 실행하고 결과 출력 후 종료
    if args.once {
        let result = orchestrator
            .run_cycle(Trigger::Manual)
            .await
            .context("분석 사이클 실패")?
            .context("사이클이 결과 없이 종료됨")?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    // 자동 반복
    if args.auto {
        let interval = orchestrator.start_auto(config.engine.default_interval_secs);
        info!("자동 반복 가동 (간격 {interval}초)");
    }

    // 웹 서버
    let server = WebServer::new(
        config.web.clone(),
        provider,
        Arc::clone(&orchestrator),
        config.engine.default_interval_secs,
    );
    info!("웹 프록시: {}", server.url());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_handle = tokio::spawn(server.run(shutdown_rx));

    // Ctrl+C 대기 후 graceful shutdown
    tokio::signal::ctrl_c()
        .await
        .context("종료 신호 대기 실패")?;
    info!("종료 신호 수신, 정리 중...");

    orchestrator.stop_auto();
    let _ = shutdown_tx.send(true);

    server_handle
        .await
        .context("웹 서버 태스크 join 실패")?
        .context("웹 서버 종료 실패")?;

    info!("CAMWATCH 종료");
    Ok(())
}
