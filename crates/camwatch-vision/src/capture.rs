//! 스크린 캡처 프레임 소스.
//!
//! xcap 기반 주 모니터 캡처 → 비율 유지 축소 → JPEG 페이로드.

use async_trait::async_trait;
use camwatch_core::error::CoreError;
use camwatch_core::models::image::{ImageKind, ImagePayload};
use camwatch_core::ports::frame_source::FrameSource;
use image::DynamicImage;
use tracing::debug;
use xcap::Monitor;

use crate::encoder::{self, DEFAULT_JPEG_QUALITY};

/// 스크린 캡처 프레임 소스 — `FrameSource` 포트 구현
pub struct ScreenFrameSource {
    /// 프레임 최대 너비 (초과 시 축소)
    max_width: u32,
    /// JPEG 품질
    quality: u8,
}

impl ScreenFrameSource {
    /// 새 캡처 소스 생성
    pub fn new(max_width: u32) -> Self {
        Self {
            max_width,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// JPEG 품질 설정
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// 주 모니터 스크린 캡처
    fn capture_primary() -> Result<DynamicImage, CoreError> {
        let monitors = Monitor::all()
            .map_err(|e| CoreError::CaptureFailed(format!("모니터 목록 조회 실패: {e}")))?;

        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| Monitor::all().ok()?.into_iter().next())
            .ok_or(CoreError::CaptureUnavailable)?;

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::CaptureFailed(format!("스크린 캡처 실패: {e}")))?;

        debug!("스크린 캡처 완료: {}x{}", image.width(), image.height());

        Ok(DynamicImage::ImageRgba8(image))
    }
}

#[async_trait]
impl FrameSource for ScreenFrameSource {
    fn is_ready(&self) -> bool {
        Monitor::all().map(|m| !m.is_empty()).unwrap_or(false)
    }

    async fn acquire(&self) -> Result<ImagePayload, CoreError> {
        let max_width = self.max_width;
        let quality = self.quality;

        // xcap 캡처는 블로킹 호출 — 런타임 워커를 막지 않도록 분리
        let data = tokio_blocking(move || {
            let frame = Self::capture_primary()?;
            let scaled = encoder::downscale_to_width(&frame, max_width)?;
            encoder::encode_jpeg(&scaled, quality)
        })
        .await?;

        if data.is_empty() {
            return Err(CoreError::CaptureFailed("빈 프레임".to_string()));
        }

        Ok(ImagePayload::new(ImageKind::Jpeg, data))
    }

    fn source_name(&self) -> &str {
        "screen"
    }
}

/// 블로킹 클로저를 tokio 블로킹 풀에서 실행
async fn tokio_blocking<T, F>(f: F) -> Result<T, CoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Internal(format!("블로킹 태스크 실패: {e}")))?
}
