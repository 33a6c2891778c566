//! 분석 요청/결과 모델.
//!
//! 2단계 프롬프트 체인의 입력(`AnalysisRequest`)과
//! 사이클당 정확히 하나 생성되는 불변 기록(`AnalysisResult`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::image::ImagePayload;

/// 업스트림이 빈 텍스트를 반환했을 때 기록되는 대체 문자열
pub const NO_RESPONSE_SENTINEL: &str = "[No response]";

/// 2차 단계 실패 시 `secondary_text`에 기록되는 문자열
pub const SECONDARY_FAILED_SENTINEL: &str = "Analysis failed";

/// 사이클 트리거 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// 사용자 수동 실행 — 바쁨 거부 시 에러로 통지
    Manual,
    /// 타이머 자동 실행 — 바쁨 시 조용히 스킵
    Automatic,
}

/// 사이클 종료 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// 1차/2차 모두 성공
    Success,
    /// 1차 성공, 2차 실패 — 1차 결과는 보존
    Partial,
    /// 캡처 또는 1차 단계 실패
    Failure,
}

/// 분석 요청 — 프레임 하나 + 프롬프트 두 개
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// 캡처된 프레임
    pub image: ImagePayload,
    /// 1차 프롬프트 (원시 프레임 분석)
    pub primary_prompt: String,
    /// 2차 프롬프트 (1차 결과를 덧붙여 호출)
    pub secondary_prompt: String,
}

impl AnalysisRequest {
    /// 요청 유효성 검증.
    ///
    /// 두 프롬프트 모두 trim 후 비어 있으면 안 되고,
    /// 이미지 페이로드도 비어 있으면 안 된다.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_prompt("primaryPrompt", &self.primary_prompt)?;
        validate_prompt("secondaryPrompt", &self.secondary_prompt)?;
        if self.image.is_empty() {
            return Err(CoreError::validation("image", "이미지 데이터 없음"));
        }
        Ok(())
    }
}

/// 프롬프트 비어있음 검증 (trim 기준)
pub fn validate_prompt(field: &str, prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::validation(field, "프롬프트가 비어 있음"));
    }
    Ok(())
}

/// 완료된 사이클의 불변 기록.
///
/// 생성 후 수정되지 않으며, 히스토리에서 최신순으로 보관된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 기록 ID
    pub id: Uuid,
    /// 사이클 완료 시각
    pub timestamp: DateTime<Utc>,
    /// 사용된 1차 프롬프트
    pub primary_prompt: String,
    /// 사용된 2차 프롬프트 (합성 전 원문)
    pub secondary_prompt: String,
    /// 1차 응답 텍스트 (실패 시 에러 텍스트)
    pub primary_text: String,
    /// 2차 응답 텍스트 (실패 시 실패 문자열)
    pub secondary_text: String,
    /// 트리거 종류
    pub trigger: Trigger,
    /// 종료 결과
    pub outcome: Outcome,
}

impl AnalysisResult {
    /// 새 기록 생성 (시각은 현재, ID는 v4)
    pub fn new(
        primary_prompt: String,
        secondary_prompt: String,
        primary_text: String,
        secondary_text: String,
        trigger: Trigger,
        outcome: Outcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            primary_prompt,
            secondary_prompt,
            primary_text,
            secondary_text,
            trigger,
            outcome,
        }
    }

    /// 실패 기록 생성 — 에러 텍스트를 1차 응답 위치에 보존한다.
    ///
    /// 실패도 히스토리에 남는다. 조용한 데이터 유실 금지.
    pub fn failure(
        primary_prompt: String,
        secondary_prompt: String,
        error_text: String,
        trigger: Trigger,
    ) -> Self {
        Self::new(
            primary_prompt,
            secondary_prompt,
            format!("Error: {error_text}"),
            SECONDARY_FAILED_SENTINEL.to_string(),
            trigger,
            Outcome::Failure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::ImageKind;
    use assert_matches::assert_matches;

    fn request(primary: &str, secondary: &str) -> AnalysisRequest {
        AnalysisRequest {
            image: ImagePayload::new(ImageKind::Jpeg, vec![1, 2, 3]),
            primary_prompt: primary.to_string(),
            secondary_prompt: secondary.to_string(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request("describe", "follow up").validate().is_ok());
    }

    #[test]
    fn blank_primary_rejected() {
        let err = request("   ", "follow up").validate().unwrap_err();
        assert_matches!(err, CoreError::Validation { field, .. } if field == "primaryPrompt");
    }

    #[test]
    fn blank_secondary_rejected() {
        let err = request("describe", "\n\t").validate().unwrap_err();
        assert_matches!(err, CoreError::Validation { field, .. } if field == "secondaryPrompt");
    }

    #[test]
    fn empty_image_rejected() {
        let mut req = request("describe", "follow up");
        req.image.data.clear();
        assert_matches!(req.validate(), Err(CoreError::Validation { .. }));
    }

    #[test]
    fn failure_record_embeds_error() {
        let result = AnalysisResult::failure(
            "p".to_string(),
            "s".to_string(),
            "boom".to_string(),
            Trigger::Automatic,
        );
        assert_eq!(result.outcome, Outcome::Failure);
        assert_eq!(result.primary_text, "Error: boom");
        assert_eq!(result.secondary_text, SECONDARY_FAILED_SENTINEL);
    }
}
