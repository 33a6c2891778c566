//! 체인 오케스트레이터.
//!
//! 사이클 하나 = 프레임 캡처 → 1차 호출 → 2차 호출 → 기록 발행.
//!
//! 보호하는 불변식:
//! - 단일 비행: 인스턴스당 동시에 사이클 하나만. 수동 트리거는 거부를
//!   통지받고, 자동 트리거는 조용히 스킵된다 (누적 금지).
//! - busy 플래그는 모든 종료 경로에서 해제된다 (Drop 가드).
//! - busy 가드를 통과한 사이클은 (실패 포함) 정확히 하나의 기록을 남긴다.
//!   단, 캡처 소스 미준비는 전제조건 실패로 기록 없이 에러만 반환한다.
//! - 자동 반복 시작은 멱등: 이전 스케줄을 먼저 완전히 중단한다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use camwatch_core::error::CoreError;
use camwatch_core::models::analysis::{
    validate_prompt, AnalysisResult, Trigger,
};
use camwatch_core::ports::completion::CompletionProvider;
use camwatch_core::ports::frame_source::FrameSource;
use camwatch_core::ports::result_sink::ResultSink;

use crate::chain;
use crate::history::AnalysisHistory;

/// 엔진 상태 요약 (웹 상태 API용)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    /// 자동 반복 활성 여부
    pub running: bool,
    /// 사이클 진행 중 여부
    pub busy: bool,
    /// 자동 반복 간격 (초, 실행 중일 때만)
    pub interval_secs: Option<u64>,
}

/// 활성 자동 반복 스케줄
struct AutoRepeat {
    handle: JoinHandle<()>,
    interval_secs: u64,
}

/// busy 플래그 스코프 가드 — 패닉 포함 모든 경로에서 해제 보장
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 체인 오케스트레이터
pub struct ChainOrchestrator {
    frame_source: Arc<dyn FrameSource>,
    provider: Arc<dyn CompletionProvider>,
    history: Arc<AnalysisHistory>,
    /// 히스토리 외 추가 싱크 (UI, 내보내기 등)
    extra_sinks: Vec<Arc<dyn ResultSink>>,
    /// (1차 프롬프트, 2차 프롬프트)
    prompts: RwLock<(String, String)>,
    /// 자동 반복 간격 하한 (초)
    min_interval_secs: u64,
    /// 단일 비행 가드 — 외부에서 직접 설정 불가
    is_busy: AtomicBool,
    /// 활성 자동 반복 (None이면 Idle)
    auto: Mutex<Option<AutoRepeat>>,
}

impl ChainOrchestrator {
    /// 새 오케스트레이터 생성
    pub fn new(
        frame_source: Arc<dyn FrameSource>,
        provider: Arc<dyn CompletionProvider>,
        history: Arc<AnalysisHistory>,
        primary_prompt: String,
        secondary_prompt: String,
        min_interval_secs: u64,
    ) -> Self {
        Self {
            frame_source,
            provider,
            history,
            extra_sinks: Vec::new(),
            prompts: RwLock::new((primary_prompt, secondary_prompt)),
            min_interval_secs,
            is_busy: AtomicBool::new(false),
            auto: Mutex::new(None),
        }
    }

    /// 추가 결과 싱크 등록
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    /// 프롬프트 쌍 교체 (다음 사이클부터 적용)
    pub fn set_prompts(&self, primary: String, secondary: String) -> Result<(), CoreError> {
        validate_prompt("primaryPrompt", &primary)?;
        validate_prompt("secondaryPrompt", &secondary)?;
        *self.prompts.write() = (primary, secondary);
        Ok(())
    }

    /// 결과 히스토리 핸들
    pub fn history(&self) -> Arc<AnalysisHistory> {
        Arc::clone(&self.history)
    }

    /// 현재 상태 요약
    pub fn status(&self) -> EngineStatus {
        let auto = self.auto.lock();
        EngineStatus {
            running: auto.is_some(),
            busy: self.is_busy.load(Ordering::SeqCst),
            interval_secs: auto.as_ref().map(|a| a.interval_secs),
        }
    }

    /// 사이클 하나 실행.
    ///
    /// 반환:
    /// - `Ok(Some(result))` — 사이클 완주 (성공/부분/실패 기록 포함)
    /// - `Ok(None)` — 자동 트리거가 busy 가드에 걸려 조용히 스킵됨
    /// - `Err(AlreadyInProgress)` — 수동 트리거가 busy 가드에 걸림
    /// - `Err(CaptureUnavailable)` — 소스 미준비 (기록 없음)
    /// - `Err(Validation)` — 프롬프트 불량 (기록 없음)
    pub async fn run_cycle(
        &self,
        trigger: Trigger,
    ) -> Result<Option<AnalysisResult>, CoreError> {
        // 단일 비행 가드 — 성공 시에만 busy 소유
        if self
            .is_busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return match trigger {
                Trigger::Manual => Err(CoreError::AlreadyInProgress),
                Trigger::Automatic => {
                    // 자동 사이클은 절대 쌓이지 않는다 — 조용히 스킵
                    debug!("사이클 진행 중, 자동 트리거 스킵");
                    Ok(None)
                }
            };
        }
        let _guard = BusyGuard(&self.is_busy);

        let (primary_prompt, secondary_prompt) = self.prompts.read().clone();
        validate_prompt("primaryPrompt", &primary_prompt)?;
        validate_prompt("secondaryPrompt", &secondary_prompt)?;

        if !self.frame_source.is_ready() {
            return Err(CoreError::CaptureUnavailable);
        }

        // 캡처 실패도 히스토리에 남긴다 — 조용한 유실 금지
        let image = match self.frame_source.acquire().await {
            Ok(image) if !image.is_empty() => image,
            Ok(_) => {
                return Ok(Some(self.record_failure(
                    primary_prompt,
                    secondary_prompt,
                    "빈 프레임".to_string(),
                    trigger,
                )))
            }
            Err(e) => {
                warn!(error = %e, "프레임 캡처 실패");
                return Ok(Some(self.record_failure(
                    primary_prompt,
                    secondary_prompt,
                    e.to_string(),
                    trigger,
                )));
            }
        };

        let result = match chain::run_chain(
            self.provider.as_ref(),
            &image,
            &primary_prompt,
            &secondary_prompt,
        )
        .await
        {
            Ok(output) => AnalysisResult::new(
                primary_prompt,
                secondary_prompt,
                output.primary_text,
                output.secondary_text,
                trigger,
                output.outcome,
            ),
            Err(e) => {
                warn!(error = %e, "1차 단계 실패, 사이클 실패 기록");
                AnalysisResult::failure(
                    primary_prompt,
                    secondary_prompt,
                    e.to_string(),
                    trigger,
                )
            }
        };

        self.publish(&result);
        Ok(Some(result))
    }

    /// 완료 기록을 히스토리와 추가 싱크에 발행
    fn publish(&self, result: &AnalysisResult) {
        self.history.publish(result);
        for sink in &self.extra_sinks {
            sink.publish(result);
        }
    }

    fn record_failure(
        &self,
        primary_prompt: String,
        secondary_prompt: String,
        error_text: String,
        trigger: Trigger,
    ) -> AnalysisResult {
        let result =
            AnalysisResult::failure(primary_prompt, secondary_prompt, error_text, trigger);
        self.publish(&result);
        result
    }

    /// 자동 반복 시작.
    ///
    /// 간격은 하한으로 클램프되어 반환된다. 즉시 사이클 하나를 실행한 뒤
    /// 고정 간격으로 반복한다. 이미 실행 중이면 이전 스케줄을 먼저 완전히
    /// 중단한다 (타이머 중복 금지). 교체는 `auto` 잠금을 쥔 채 한 번에
    /// 이루어지므로 동시 시작이 타이머를 누수시키지 않는다.
    pub fn start_auto(self: &Arc<Self>, interval_secs: u64) -> u64 {
        let clamped = interval_secs.max(self.min_interval_secs);
        if clamped != interval_secs {
            debug!(
                requested = interval_secs,
                clamped, "간격이 하한보다 작아 클램프됨"
            );
        }

        let mut auto = self.auto.lock();
        if let Some(prev) = auto.take() {
            prev.handle.abort();
            info!("기존 자동 반복 교체");
        }

        let orchestrator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(clamped));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // 첫 tick은 즉시 완료 — 시작 직후 사이클 하나 실행
                ticker.tick().await;

                // 사이클은 별도 태스크로 분리한다. 스케줄러 중단(abort)이
                // 진행 중 사이클까지 죽이지 않게 하기 위함이다.
                // 중복 실행은 busy 가드가 막는다.
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    if let Err(e) = orchestrator.run_cycle(Trigger::Automatic).await {
                        warn!(error = %e, "자동 사이클 실패");
                    }
                });
            }
        });

        *auto = Some(AutoRepeat {
            handle,
            interval_secs: clamped,
        });
        info!(interval_secs = clamped, "자동 반복 시작");

        clamped
    }

    /// 자동 반복 중지.
    ///
    /// 예약된 미래 사이클만 취소한다. 진행 중인 사이클은 별도 태스크라
    /// 완주한다 (업스트림 호출 중단 메커니즘 없음 — busy 가드가 중복을
    /// 계속 막는다).
    ///
    /// 실행 중이었으면 `true` 반환.
    pub fn stop_auto(&self) -> bool {
        match self.auto.lock().take() {
            Some(auto) => {
                auto.handle.abort();
                info!("자동 반복 중지");
                true
            }
            None => false,
        }
    }
}

impl Drop for ChainOrchestrator {
    fn drop(&mut self) {
        if let Some(auto) = self.auto.get_mut().take() {
            auto.handle.abort();
        }
    }
}
