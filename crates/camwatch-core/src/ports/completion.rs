//! 비전 완성(completion) 포트.
//!
//! 구현: `camwatch-network` crate (`OpenAiVisionClient`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::image::ImagePayload;

/// 비전 완성 제공자 — (프레임, 프롬프트) 한 쌍당 한 번의 왕복.
///
/// 내부 재시도는 하지 않는다. 재시도 정책이 필요하면 호출자 몫이다.
/// 호출마다 과금될 수 있으므로 멱등으로 취급하지 않는다.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 프레임 + 프롬프트를 업스트림에 보내고 응답 텍스트를 반환.
    ///
    /// 실패 분류:
    /// - non-2xx → `Endpoint { status, message }`
    /// - 시간 초과 → `Timeout`
    /// - 응답에서 텍스트 추출 불가 → `MalformedResponse`
    async fn complete(&self, image: &ImagePayload, prompt: &str) -> Result<String, CoreError>;

    /// 제공자 이름 (예: "openai-vision")
    fn provider_name(&self) -> &str;
}
