//! 애플리케이션 설정 구조체.
//!
//! 업스트림 엔드포인트, 엔진 주기, 웹 프록시 설정 등
//! 런타임 설정을 정의한다. JSON 파일로 저장/로드 ([`crate::config_manager`]).

use serde::{Deserialize, Serialize};

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 업스트림 비전 API 설정
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 분석 엔진 설정
    #[serde(default)]
    pub engine: EngineConfig,
    /// 웹 프록시 설정
    #[serde(default)]
    pub web: WebConfig,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            engine: EngineConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 업스트림 비전 API 설정
// ============================================================

/// 이미지 detail 수준 — 업스트림 토큰 비용 제어
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// 저해상도 처리 (기본 — 토큰 절약)
    #[default]
    Low,
    /// 고해상도 처리
    High,
}

impl ImageDetail {
    /// 와이어 포맷 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
        }
    }
}

/// 업스트림 비전 완성 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// chat-completions 엔드포인트 URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API 키 — 비어 있으면 환경변수 `OPENAI_API_KEY` 사용
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름
    #[serde(default = "default_model")]
    pub model: String,
    /// 응답 최대 토큰 수
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 이미지 detail 수준
    #[serde(default)]
    pub detail: ImageDetail,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// API 키 결정 — 설정값 우선, 없으면 환경변수.
    ///
    /// 둘 다 비어 있으면 `None` (어댑터 생성 시 `Config` 에러).
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_config = self.api_key.trim();
        if !from_config.is_empty() {
            return Some(from_config.to_string());
        }
        std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            detail: ImageDetail::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

// ============================================================
// 분석 엔진 설정
// ============================================================

/// 분석 엔진(오케스트레이터) 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 자동 반복 최소 간격 (초) — 이보다 작은 값은 클램프
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    /// 자동 반복 기본 간격 (초)
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: u64,
    /// 캡처 프레임 최대 너비 (픽셀) — 초과 시 비율 유지 축소
    #[serde(default = "default_capture_max_width")]
    pub capture_max_width: u32,
    /// 1차 프롬프트 기본값
    #[serde(default = "default_primary_prompt")]
    pub primary_prompt: String,
    /// 2차 프롬프트 기본값
    #[serde(default = "default_secondary_prompt")]
    pub secondary_prompt: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            default_interval_secs: default_interval_secs(),
            capture_max_width: default_capture_max_width(),
            primary_prompt: default_primary_prompt(),
            secondary_prompt: default_secondary_prompt(),
        }
    }
}

fn default_min_interval_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    30
}

fn default_capture_max_width() -> u32 {
    1280
}

fn default_primary_prompt() -> String {
    "Describe what you see in this frame.".to_string()
}

fn default_secondary_prompt() -> String {
    "Is there anything unusual or noteworthy?".to_string()
}

// ============================================================
// 웹 프록시 설정
// ============================================================

/// 웹 프록시 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 리스닝 포트
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부(0.0.0.0) 접근 허용 여부
    #[serde(default)]
    pub allow_external: bool,
    /// 클라이언트별 쓰로틀 활성화
    #[serde(default = "default_true")]
    pub throttle_enabled: bool,
    /// 쓰로틀 윈도우 (초) — 클라이언트당 해당 기간 1회
    #[serde(default = "default_throttle_secs")]
    pub throttle_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            allow_external: false,
            throttle_enabled: default_true(),
            throttle_secs: default_throttle_secs(),
        }
    }
}

fn default_web_port() -> u16 {
    9090
}

fn default_true() -> bool {
    true
}

fn default_throttle_secs() -> u64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.upstream.model, "gpt-4o");
        assert_eq!(config.upstream.detail, ImageDetail::Low);
        assert_eq!(config.engine.capture_max_width, 1280);
    }

    #[test]
    fn partial_section_overrides() {
        let config: AppConfig =
            serde_json::from_str(r#"{"web":{"port":8080,"throttle_enabled":false}}"#).unwrap();
        assert_eq!(config.web.port, 8080);
        assert!(!config.web.throttle_enabled);
        assert_eq!(config.web.throttle_secs, 20);
    }

    #[test]
    fn detail_wire_strings() {
        assert_eq!(ImageDetail::Low.as_str(), "low");
        assert_eq!(ImageDetail::High.as_str(), "high");
    }

    #[test]
    fn config_api_key_takes_precedence() {
        let config = UpstreamConfig {
            api_key: "sk-from-config".to_string(),
            ..UpstreamConfig::default()
        };
        assert_eq!(config.resolved_api_key().unwrap(), "sk-from-config");
    }
}
