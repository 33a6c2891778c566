//! 정지 이미지 프레임 소스.
//!
//! 파일 하나를 읽어 매 획득마다 동일 페이로드를 제공한다.
//! 카메라/모니터 없는 환경의 데모와 테스트에 사용.

use std::path::Path;

use async_trait::async_trait;
use camwatch_core::error::CoreError;
use camwatch_core::models::image::{ImageKind, ImagePayload};
use camwatch_core::ports::frame_source::FrameSource;

/// 정지 이미지 프레임 소스 — `FrameSource` 포트 구현
pub struct StillFrameSource {
    payload: ImagePayload,
}

impl StillFrameSource {
    /// 파일에서 소스 생성. 포맷은 확장자로 판별한다 (jpg/jpeg/png).
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let kind = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => ImageKind::Jpeg,
            Some("png") => ImageKind::Png,
            other => {
                return Err(CoreError::validation(
                    "image",
                    format!("지원하지 않는 확장자: {other:?} (jpg/jpeg/png만 허용)"),
                ))
            }
        };

        let data = std::fs::read(path)
            .map_err(|e| CoreError::CaptureFailed(format!("{} 읽기 실패: {e}", path.display())))?;

        if data.is_empty() {
            return Err(CoreError::CaptureFailed(format!(
                "{} 내용 없음",
                path.display()
            )));
        }

        Ok(Self {
            payload: ImagePayload::new(kind, data),
        })
    }

    /// 미리 준비한 페이로드로 생성 (테스트용)
    pub fn from_payload(payload: ImagePayload) -> Self {
        Self { payload }
    }
}

#[async_trait]
impl FrameSource for StillFrameSource {
    fn is_ready(&self) -> bool {
        true
    }

    async fn acquire(&self) -> Result<ImagePayload, CoreError> {
        Ok(self.payload.clone())
    }

    fn source_name(&self) -> &str {
        "still-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn serves_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let source = StillFrameSource::from_path(&path).unwrap();
        assert!(source.is_ready());

        let payload = source.acquire().await.unwrap();
        assert_eq!(payload.kind, ImageKind::Jpeg);
        assert_eq!(payload.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn unsupported_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.gif");
        std::fs::write(&path, [1, 2, 3]).unwrap();

        assert!(matches!(
            StillFrameSource::from_path(&path),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn missing_file_is_capture_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert!(matches!(
            StillFrameSource::from_path(&path),
            Err(CoreError::CaptureFailed(_))
        ));
    }
}
