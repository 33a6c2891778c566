//! 결과 싱크 포트.
//!
//! 구현: `camwatch-engine`의 `AnalysisHistory` (기본),
//! 외부 UI/내보내기 레이어가 추가 구현 가능.

use crate::models::analysis::AnalysisResult;

/// 결과 싱크 — 완료된 사이클의 기록을 소비한다.
///
/// 오케스트레이터는 busy 가드를 통과한 모든 사이클마다
/// (실패 포함) 정확히 한 번 `publish`를 호출한다.
pub trait ResultSink: Send + Sync {
    /// 완료된 기록 하나 소비
    fn publish(&self, result: &AnalysisResult);
}
