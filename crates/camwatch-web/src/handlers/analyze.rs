//! 분석 프록시 API 핸들러.
//!
//! 클라이언트가 보낸 프레임을 업스트림 비전 API로 전달한다.
//! 프롬프트 두 개(1차/2차)면 체인 실행, 하나(`prompt`)면 단발 호출.
//! API 키는 서버 쪽에서만 부착된다 — 클라이언트에 절대 노출하지 않는다.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use camwatch_core::models::analysis::validate_prompt;
use camwatch_core::models::image::ImagePayload;
use camwatch_engine::chain;

use crate::{error::ApiError, AppState};

/// 필수 필드 누락 시 응답 메시지
const MISSING_FIELDS_MESSAGE: &str = "Missing image or prompt in request body.";

/// 단발 호출 응답이 비어 있을 때의 대체 문자열
const NO_DESCRIPTION: &str = "No description found.";

/// 분석 요청 본문.
///
/// 두 가지 모드를 받는다:
/// - 체인 모드: `primaryPrompt` + `secondaryPrompt`
/// - 단발 모드: `prompt`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    /// data URI 형식 프레임 (base64 JPEG/PNG)
    pub image: Option<String>,
    /// 단발 모드 프롬프트
    pub prompt: Option<String>,
    /// 체인 모드 1차 프롬프트
    pub primary_prompt: Option<String>,
    /// 체인 모드 2차 프롬프트
    pub secondary_prompt: Option<String>,
}

/// 체인 모드 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResponse {
    pub primary_response: String,
    pub secondary_response: String,
    pub timestamp: DateTime<Utc>,
}

/// POST /api/analyze - 프레임 분석 프록시
pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<Value>, ApiError> {
    let image_uri = body
        .image
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_FIELDS_MESSAGE.to_string()))?;

    // 체인 모드가 우선 — 두 프롬프트가 모두 있을 때만
    if let (Some(primary), Some(secondary)) =
        (body.primary_prompt.as_deref(), body.secondary_prompt.as_deref())
    {
        validate_prompt("primaryPrompt", primary)
            .and(validate_prompt("secondaryPrompt", secondary))
            .map_err(|_| ApiError::BadRequest(MISSING_FIELDS_MESSAGE.to_string()))?;

        let image = ImagePayload::from_data_uri(image_uri)?;
        info!(bytes = image.data.len(), "체인 분석 프록시 요청");

        let output =
            chain::run_chain(state.provider.as_ref(), &image, primary, secondary).await?;

        return Ok(Json(json!(ChainResponse {
            primary_response: output.primary_text,
            secondary_response: output.secondary_text,
            timestamp: Utc::now(),
        })));
    }

    // 단발 모드
    let prompt = body
        .prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_FIELDS_MESSAGE.to_string()))?;

    let image = ImagePayload::from_data_uri(image_uri)?;
    info!(bytes = image.data.len(), "단발 분석 프록시 요청");

    let reply = state.provider.complete(&image, prompt).await?;
    let description = if reply.trim().is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        reply
    };

    Ok(Json(json!({ "description": description })))
}
