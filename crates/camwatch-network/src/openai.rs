//! 외부 비전 완성 클라이언트.
//!
//! OpenAI 호환 `POST /v1/chat/completions`에 (프레임, 프롬프트)를 보내고
//! `choices[0].message.content`를 추출한다.
//!
//! **재시도 없음** — 호출마다 과금될 수 있으므로 재시도 정책은 호출자 몫이다.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use camwatch_core::config::{ImageDetail, UpstreamConfig};
use camwatch_core::error::CoreError;
use camwatch_core::models::image::ImagePayload;
use camwatch_core::ports::completion::CompletionProvider;

// ============================================================
// OpenAiVisionClient — 업스트림 비전 완성 클라이언트
// ============================================================

/// OpenAI 호환 비전 완성 클라이언트 — `CompletionProvider` 포트 구현
///
/// 와이어 계약:
/// - 요청: `{ model, messages: [{role:"user", content:[{type:"text"},{type:"image_url"}]}], max_tokens }`
/// - 응답: `choices[0].message.content`
///
/// **보안**: API 키는 설정 또는 `OPENAI_API_KEY` 환경변수에서 로드, 메모리에만 유지.
#[derive(Debug)]
pub struct OpenAiVisionClient {
    /// HTTP 클라이언트
    http_client: reqwest::Client,
    /// chat-completions 엔드포인트 URL
    endpoint: String,
    /// API 키 (메모리에만 유지)
    api_key: String,
    /// 모델 이름
    model: String,
    /// 응답 최대 토큰 수
    max_tokens: u32,
    /// 이미지 detail 수준
    detail: ImageDetail,
}

impl OpenAiVisionClient {
    /// 새 OpenAiVisionClient 생성.
    ///
    /// API 키가 설정에도 환경변수에도 없으면 `Config` 에러.
    pub fn new(config: &UpstreamConfig) -> Result<Self, CoreError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            CoreError::Config("API key not configured in environment.".to_string())
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {e}")))?;

        debug!(
            endpoint = %config.endpoint,
            model = %config.model,
            timeout = config.timeout_secs,
            "OpenAiVisionClient 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            detail: config.detail,
        })
    }

    /// 요청 본문 구성
    fn build_request_body(&self, image: &ImagePayload, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": image.to_data_uri(),
                            "detail": self.detail.as_str(),
                        },
                    },
                ],
            }],
            "max_tokens": self.max_tokens,
        })
    }

    /// 응답에서 결과 텍스트 추출 (`choices[0].message.content`)
    fn extract_content(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::MalformedResponse(format!("응답 JSON 파싱 실패: {e}")))?;

        response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| {
                CoreError::MalformedResponse(
                    "choices[0].message.content 필드 없음".to_string(),
                )
            })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiVisionClient {
    async fn complete(&self, image: &ImagePayload, prompt: &str) -> Result<String, CoreError> {
        let body = self.build_request_body(image, prompt);

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::Network(format!("업스트림 요청 실패: {e}"))
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::Timeout
            } else {
                CoreError::Network(format!("응답 본문 수신 실패: {e}"))
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "업스트림 비정상 응답");
            return Err(CoreError::Endpoint {
                status: status.as_u16(),
                message: text,
            });
        }

        let content = Self::extract_content(&text)?;
        debug!(chars = content.len(), "업스트림 응답 수신");

        Ok(content)
    }

    fn provider_name(&self) -> &str {
        "openai-vision"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use camwatch_core::models::image::ImageKind;

    fn test_config(endpoint: &str) -> UpstreamConfig {
        UpstreamConfig {
            endpoint: endpoint.to_string(),
            api_key: "sk-test".to_string(),
            ..UpstreamConfig::default()
        }
    }

    fn frame() -> ImagePayload {
        ImagePayload::new(ImageKind::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    #[test]
    fn missing_api_key_is_config_error() {
        // 환경변수 간섭을 피하기 위해 명시적으로 비운 키 + 환경변수 제거
        std::env::remove_var("OPENAI_API_KEY");
        let config = UpstreamConfig {
            api_key: String::new(),
            ..UpstreamConfig::default()
        };
        let err = OpenAiVisionClient::new(&config).unwrap_err();
        assert_matches!(err, CoreError::Config(msg) if msg.contains("API key not configured"));
    }

    #[test]
    fn request_body_wire_shape() {
        let client = OpenAiVisionClient::new(&test_config("http://localhost:1")).unwrap();
        let body = client.build_request_body(&frame(), "What is this?");

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["type"], "text");
        assert_eq!(body["messages"][0]["content"][0]["text"], "What is this?");
        assert_eq!(body["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(body["messages"][0]["content"][1]["image_url"]["detail"], "low");
        let url = body["messages"][0]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn complete_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"A cat"}}]}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiVisionClient::new(&test_config(&endpoint)).unwrap();

        let text = client.complete(&frame(), "describe").await.unwrap();
        assert_eq!(text, "A cat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_error_propagates_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body(r#"{"error":{"message":"boom"}}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiVisionClient::new(&test_config(&endpoint)).unwrap();

        let err = client.complete(&frame(), "describe").await.unwrap_err();
        assert_matches!(err, CoreError::Endpoint { status: 500, message } if message.contains("boom"));
    }

    #[tokio::test]
    async fn rate_limit_status_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"slow down"}}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiVisionClient::new(&test_config(&endpoint)).unwrap();

        let err = client.complete(&frame(), "describe").await.unwrap_err();
        assert_matches!(err, CoreError::Endpoint { status: 429, .. });
    }

    #[tokio::test]
    async fn missing_content_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiVisionClient::new(&test_config(&endpoint)).unwrap();

        let err = client.complete(&frame(), "describe").await.unwrap_err();
        assert_matches!(err, CoreError::MalformedResponse(_));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let endpoint = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiVisionClient::new(&test_config(&endpoint)).unwrap();

        let err = client.complete(&frame(), "describe").await.unwrap_err();
        assert_matches!(err, CoreError::MalformedResponse(_));
    }
}
