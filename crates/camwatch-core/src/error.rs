//! CAMWATCH 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러 타입에서 `#[from] CoreError`로 래핑하거나
//! `CoreError`를 직접 반환한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 캡처, 업스트림 호출, 유효성 검증 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 캡처 장치/소스가 준비되지 않음
    #[error("캡처 소스 미준비 — 프레임 소스를 먼저 시작하세요")]
    CaptureUnavailable,

    /// 캡처 소스는 준비되었으나 프레임 획득 실패
    #[error("프레임 캡처 실패: {0}")]
    CaptureFailed(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 업스트림 엔드포인트 비정상 응답 (non-2xx)
    #[error("업스트림 에러 ({status}): {message}")]
    Endpoint {
        /// HTTP 상태 코드
        status: u16,
        /// 업스트림이 반환한 에러 본문
        message: String,
    },

    /// 요청 시간 초과
    #[error("업스트림 응답 시간 초과")]
    Timeout,

    /// 응답 본문을 기대한 형태로 파싱할 수 없음
    #[error("응답 파싱 실패: {0}")]
    MalformedResponse(String),

    /// 분석 사이클이 이미 진행 중 (단일 비행 가드)
    #[error("분석이 이미 진행 중입니다")]
    AlreadyInProgress,

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_ms}ms 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (밀리초)
        retry_after_ms: u64,
    },

    /// 설정값 오류 (API 키 미설정 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 네트워크 에러 (연결 실패 등)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 필드 유효성 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::Endpoint {
            status: 500,
            message: "upstream exploded".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn validation_helper() {
        let err = CoreError::validation("primaryPrompt", "빈 문자열");
        match err {
            CoreError::Validation { field, message } => {
                assert_eq!(field, "primaryPrompt");
                assert_eq!(message, "빈 문자열");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
