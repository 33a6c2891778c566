//! JPEG 인코더.
//!
//! 비율 유지 축소(fast_image_resize) + JPEG 인코딩.
//! 업스트림 와이어 계약이 JPEG/PNG 데이터 URI만 받으므로 JPEG으로 통일한다.

use camwatch_core::error::CoreError;
use fast_image_resize::{images::Image as FirImage, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// 기본 JPEG 품질 — 원본 프런트엔드의 canvas 품질 0.8에 대응
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// JPEG 인코딩.
///
/// JPEG은 알파를 지원하지 않으므로 RGB8로 변환 후 인코딩한다.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();

    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CoreError::Internal(format!("JPEG 인코딩 실패: {e}")))?;

    debug!(
        "JPEG 인코딩: {}x{} → {} bytes (품질 {})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        quality
    );

    Ok(buf)
}

/// 최대 너비 기준 비율 유지 축소.
///
/// 이미 `max_width` 이하면 복제 반환. 확대는 하지 않는다.
pub fn downscale_to_width(image: &DynamicImage, max_width: u32) -> Result<DynamicImage, CoreError> {
    let (src_w, src_h) = (image.width(), image.height());

    if src_w == 0 || src_h == 0 {
        return Err(CoreError::Internal("소스 이미지 크기 0".to_string()));
    }
    if max_width == 0 {
        return Err(CoreError::Internal("목표 너비 0".to_string()));
    }
    if src_w <= max_width {
        return Ok(image.clone());
    }

    let dst_w = max_width;
    let dst_h = ((src_h as u64 * max_width as u64) / src_w as u64).max(1) as u32;

    let src_rgba = image.to_rgba8();
    let src_image = FirImage::from_vec_u8(
        src_w,
        src_h,
        src_rgba.into_raw(),
        fast_image_resize::PixelType::U8x4,
    )
    .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst_image = FirImage::new(dst_w, dst_h, fast_image_resize::PixelType::U8x4);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    let result = RgbaImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| CoreError::Internal("결과 이미지 생성 실패".to_string()))?;

    debug!("프레임 축소: {}x{} → {}x{}", src_w, src_h, dst_w, dst_h);

    Ok(DynamicImage::ImageRgba8(result))
}
