//! 이미지 페이로드.
//!
//! 업스트림 비전 API는 base64 데이터 URI(JPEG/PNG)만 받는다.
//! 다른 포맷은 경계에서 즉시 거부한다.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// JPEG 데이터 URI 접두사
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";
/// PNG 데이터 URI 접두사
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// 지원 이미지 포맷 (JPEG/PNG만 허용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// JPEG (캡처 기본 포맷)
    Jpeg,
    /// PNG
    Png,
}

impl ImageKind {
    /// MIME 타입 문자열
    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    /// 데이터 URI 접두사
    pub fn data_uri_prefix(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => JPEG_DATA_URI_PREFIX,
            ImageKind::Png => PNG_DATA_URI_PREFIX,
        }
    }
}

/// 캡처된 프레임 페이로드 — 포맷 태그 + 원시 바이트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// 이미지 포맷
    pub kind: ImageKind,
    /// 인코딩된 이미지 바이트 (JPEG/PNG 컨테이너 그대로)
    pub data: Vec<u8>,
}

impl ImagePayload {
    /// 새 페이로드 생성
    pub fn new(kind: ImageKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// base64 데이터 URI로 인코딩 (`data:image/jpeg;base64,...`)
    pub fn to_data_uri(&self) -> String {
        format!("{}{}", self.kind.data_uri_prefix(), B64.encode(&self.data))
    }

    /// 데이터 URI에서 페이로드 복원.
    ///
    /// JPEG/PNG 접두사가 아니면 `Validation` 에러.
    /// 프록시 계약: "Invalid image data format. Only base64 JPEG/PNG allowed."
    pub fn from_data_uri(uri: &str) -> Result<Self, CoreError> {
        let (kind, encoded) = if let Some(rest) = uri.strip_prefix(JPEG_DATA_URI_PREFIX) {
            (ImageKind::Jpeg, rest)
        } else if let Some(rest) = uri.strip_prefix(PNG_DATA_URI_PREFIX) {
            (ImageKind::Png, rest)
        } else {
            return Err(CoreError::validation(
                "image",
                "Invalid image data format. Only base64 JPEG/PNG allowed.",
            ));
        };

        let data = B64
            .decode(encoded)
            .map_err(|e| CoreError::validation("image", format!("base64 디코딩 실패: {e}")))?;

        Ok(Self { kind, data })
    }

    /// 페이로드가 비었는지 여부
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
