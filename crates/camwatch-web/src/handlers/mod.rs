//! API 핸들러 모듈.

pub mod analyze;
pub mod engine;
pub mod history;
