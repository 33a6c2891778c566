//! 프레임 소스 포트.
//!
//! 구현: `camwatch-vision` crate (`ScreenFrameSource`, `StillFrameSource`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::image::ImagePayload;

/// 프레임 소스 — 요청 시점의 스냅샷 하나를 제공한다.
///
/// 오케스트레이터가 요구하는 계약은 단순하다:
/// "인코딩된 이미지 페이로드를 내놓거나 실패하거나."
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// 소스가 프레임을 제공할 준비가 되었는지.
    ///
    /// `false`면 사이클은 `CaptureUnavailable`로 실패하고
    /// 히스토리에 기록을 남기지 않는다.
    fn is_ready(&self) -> bool;

    /// 프레임 하나 획득.
    ///
    /// 실패 시 `CaptureFailed` — 이 경우 사이클은 실패 기록을 남긴다.
    async fn acquire(&self) -> Result<ImagePayload, CoreError>;

    /// 소스 이름 (예: "screen", "still-file")
    fn source_name(&self) -> &str;
}
