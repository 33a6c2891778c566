//! 2단계 프롬프트 체인.
//!
//! 같은 프레임으로 두 번 호출한다: 1차는 원시 프레임 분석,
//! 2차는 1차 결과를 덧붙인 후속 질문.
//!
//! 순서 보장: 2차 호출은 1차 결과가 확정된 뒤에만 나간다.
//! 1차 실패 → 체인 전체 실패 (2차 호출 없음).
//! 2차 실패 → 부분 성공 — 1차 결과는 절대 버리지 않는다.

use tracing::{debug, warn};

use camwatch_core::error::CoreError;
use camwatch_core::models::analysis::{
    Outcome, NO_RESPONSE_SENTINEL, SECONDARY_FAILED_SENTINEL,
};
use camwatch_core::models::image::ImagePayload;
use camwatch_core::ports::completion::CompletionProvider;

/// 체인 실행 결과 — 기록 생성 전의 중간 산출물
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    /// 1차 응답 텍스트
    pub primary_text: String,
    /// 2차 응답 텍스트 (실패 시 실패 문자열)
    pub secondary_text: String,
    /// Success 또는 Partial (1차 실패는 `run_chain`의 Err)
    pub outcome: Outcome,
}

/// 후속 프롬프트 합성.
///
/// 2차 호출의 프롬프트는 (2차 프롬프트, 1차 결과)의 결정적 함수다.
/// 템플릿: `"{secondary}\n\nPrimary said: \"{primary}\""`
pub fn compose_followup(secondary_prompt: &str, primary_text: &str) -> String {
    format!("{secondary_prompt}\n\nPrimary said: \"{primary_text}\"")
}

/// 빈 응답을 대체 문자열로 정규화
fn normalize_reply(text: String) -> String {
    if text.trim().is_empty() {
        NO_RESPONSE_SENTINEL.to_string()
    } else {
        text
    }
}

/// 체인 실행 — 프레임 하나에 대해 1차 → 2차 순차 호출.
///
/// 반환:
/// - `Ok(ChainOutput { outcome: Success })` — 둘 다 성공
/// - `Ok(ChainOutput { outcome: Partial })` — 1차 성공, 2차 실패
/// - `Err(e)` — 1차 실패 (2차는 시도조차 하지 않음)
pub async fn run_chain(
    provider: &dyn CompletionProvider,
    image: &ImagePayload,
    primary_prompt: &str,
    secondary_prompt: &str,
) -> Result<ChainOutput, CoreError> {
    let primary_text = normalize_reply(provider.complete(image, primary_prompt).await?);
    debug!(chars = primary_text.len(), "1차 단계 완료");

    let followup = compose_followup(secondary_prompt, &primary_text);

    match provider.complete(image, &followup).await {
        Ok(secondary_text) => Ok(ChainOutput {
            primary_text,
            secondary_text: normalize_reply(secondary_text),
            outcome: Outcome::Success,
        }),
        Err(e) => {
            // 2차 실패는 체인을 실패시키지 않는다 — 1차 결과 보존
            warn!(error = %e, "2차 단계 실패, 부분 결과로 강등");
            Ok(ChainOutput {
                primary_text,
                secondary_text: SECONDARY_FAILED_SENTINEL.to_string(),
                outcome: Outcome::Partial,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use camwatch_core::models::image::ImageKind;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 스크립트된 응답을 순서대로 돌려주는 모의 제공자
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, CoreError>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, CoreError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            _image: &ImagePayload,
            prompt: &str,
        ) -> Result<String, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());
            self.replies.lock().remove(0)
        }

        fn provider_name(&self) -> &str {
            "scripted"
        }
    }

    fn frame() -> ImagePayload {
        ImagePayload::new(ImageKind::Jpeg, vec![1, 2, 3])
    }

    #[test]
    fn followup_template_is_deterministic() {
        let composed = compose_followup("Is it dangerous?", "A cat");
        assert_eq!(composed, "Is it dangerous?\n\nPrimary said: \"A cat\"");
    }

    #[tokio::test]
    async fn both_stages_succeed() {
        let provider = ScriptedProvider::new(vec![
            Ok("A cat".to_string()),
            Ok("Not dangerous".to_string()),
        ]);

        let output = run_chain(&provider, &frame(), "What is it?", "Is it dangerous?")
            .await
            .unwrap();

        assert_eq!(output.outcome, Outcome::Success);
        assert_eq!(output.primary_text, "A cat");
        assert_eq!(output.secondary_text, "Not dangerous");
        assert_eq!(provider.call_count(), 2);

        // 2차 프롬프트에 1차 결과가 박혀 있어야 한다
        let prompts = provider.prompts.lock();
        assert_eq!(prompts[1], "Is it dangerous?\n\nPrimary said: \"A cat\"");
    }

    #[tokio::test]
    async fn primary_failure_skips_secondary() {
        let provider = ScriptedProvider::new(vec![Err(CoreError::Endpoint {
            status: 500,
            message: "boom".to_string(),
        })]);

        let err = run_chain(&provider, &frame(), "What is it?", "Is it dangerous?")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Endpoint { status: 500, .. }));
        // 2차 호출은 절대 나가지 않는다
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn secondary_failure_degrades_to_partial() {
        let provider = ScriptedProvider::new(vec![
            Ok("A cat".to_string()),
            Err(CoreError::Timeout),
        ]);

        let output = run_chain(&provider, &frame(), "What is it?", "Is it dangerous?")
            .await
            .unwrap();

        assert_eq!(output.outcome, Outcome::Partial);
        assert_eq!(output.primary_text, "A cat");
        assert_eq!(output.secondary_text, SECONDARY_FAILED_SENTINEL);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn empty_replies_become_sentinel() {
        let provider =
            ScriptedProvider::new(vec![Ok("  ".to_string()), Ok(String::new())]);

        let output = run_chain(&provider, &frame(), "p", "s").await.unwrap();

        assert_eq!(output.primary_text, NO_RESPONSE_SENTINEL);
        assert_eq!(output.secondary_text, NO_RESPONSE_SENTINEL);
        assert_eq!(output.outcome, Outcome::Success);
    }
}
