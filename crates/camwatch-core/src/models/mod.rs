//! 도메인 데이터 모델.
//!
//! 분석 요청/결과와 이미지 페이로드 타입.
//! 모든 직렬화 타입은 API 계약에 맞춰 camelCase JSON을 사용한다.

pub mod analysis;
pub mod image;
