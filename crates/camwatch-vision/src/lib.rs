//! # camwatch-vision
//!
//! 프레임 획득 어댑터.
//! `FrameSource` 포트 구현 두 가지와 인코딩 헬퍼를 제공한다.
//!
//! - [`capture::ScreenFrameSource`] — xcap 기반 주 모니터 캡처 → 축소 → JPEG
//! - [`still::StillFrameSource`] — 파일 하나를 반복 제공 (데모/테스트용)
//! - [`encoder`] — JPEG 인코딩 + 비율 유지 축소

pub mod capture;
pub mod encoder;
pub mod still;

pub use capture::ScreenFrameSource;
pub use still::StillFrameSource;
