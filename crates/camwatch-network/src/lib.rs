//! # camwatch-network
//!
//! 업스트림 비전 완성 API 어댑터.
//! `CompletionProvider` 포트의 reqwest 구현을 제공한다.

pub mod openai;

pub use openai::OpenAiVisionClient;
