//! # camwatch-engine
//!
//! 2단계 분석 체인의 코어.
//!
//! - [`chain`] — 1차/2차 프롬프트 체인 실행과 후속 프롬프트 합성
//! - [`orchestrator`] — 단일 비행 가드 + 자동 반복 스케줄링
//! - [`history`] — 최신순 인메모리 결과 로그 + CSV 내보내기
//!
//! 동시성 모델: 오케스트레이터 인스턴스당 사이클은 논리적으로 하나만
//! 실행된다. 두 완성 호출은 순차 await이며 병렬이 아니다.

pub mod chain;
pub mod history;
pub mod orchestrator;

pub use chain::{compose_followup, run_chain, ChainOutput};
pub use history::AnalysisHistory;
pub use orchestrator::{ChainOrchestrator, EngineStatus};
