//! 분석 히스토리.
//!
//! 최신순(front가 최신) 인메모리 결과 로그. 영속화는 하지 않는다.
//! 기록은 불변이며 `clear`로만 파기된다.

use std::collections::VecDeque;

use parking_lot::RwLock;
use tracing::debug;

use camwatch_core::models::analysis::{AnalysisResult, Trigger};
use camwatch_core::ports::result_sink::ResultSink;

/// CSV 헤더 — 원본 내보내기 포맷과 동일한 컬럼 순서
const CSV_HEADERS: [&str; 6] = [
    "Timestamp",
    "Type",
    "Primary Prompt",
    "Primary Response",
    "Secondary Prompt",
    "Secondary Response",
];

/// 분석 히스토리 — `ResultSink` 포트 구현
///
/// 쓰기는 완료된 사이클에서만 발생한다. 읽기는 스냅샷 복제로 제공하여
/// 락을 잡은 채 직렬화하지 않는다.
#[derive(Debug, Default)]
pub struct AnalysisHistory {
    entries: RwLock<VecDeque<AnalysisResult>>,
}

impl AnalysisHistory {
    /// 빈 히스토리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록 추가 (최신이 맨 앞)
    pub fn push(&self, result: AnalysisResult) {
        let mut entries = self.entries.write();
        entries.push_front(result);
        debug!(len = entries.len(), "히스토리 기록 추가");
    }

    /// 현재 기록 스냅샷 (최신순)
    pub fn snapshot(&self) -> Vec<AnalysisResult> {
        self.entries.read().iter().cloned().collect()
    }

    /// 기록 수
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 전체 기록 삭제
    pub fn clear(&self) {
        self.entries.write().clear();
        debug!("히스토리 초기화");
    }

    /// CSV 내보내기 (RFC 4180 큰따옴표 이스케이프)
    pub fn to_csv(&self) -> String {
        let entries = self.snapshot();
        let mut rows = Vec::with_capacity(entries.len() + 1);

        rows.push(
            CSV_HEADERS
                .iter()
                .map(|h| csv_escape(h))
                .collect::<Vec<_>>()
                .join(","),
        );

        for entry in &entries {
            let trigger = match entry.trigger {
                Trigger::Manual => "Manual",
                Trigger::Automatic => "Auto",
            };
            let fields = [
                entry.timestamp.to_rfc3339(),
                trigger.to_string(),
                entry.primary_prompt.clone(),
                entry.primary_text.clone(),
                entry.secondary_prompt.clone(),
                entry.secondary_text.clone(),
            ];
            rows.push(
                fields
                    .iter()
                    .map(|f| csv_escape(f))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        rows.join("\n")
    }
}

impl ResultSink for AnalysisHistory {
    fn publish(&self, result: &AnalysisResult) {
        self.push(result.clone());
    }
}

/// CSV 필드 이스케이프 — 항상 큰따옴표로 감싸고 내부 따옴표는 이중화
fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
