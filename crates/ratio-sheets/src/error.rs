//! Sheets 모듈 오류 타입.

use thiserror::Error;

/// 스프레드시트 관련 오류.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// 토큰 교환 거부 또는 키 오류
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Sheets API 호출 실패 (2xx 외 응답)
    #[error("Sheets API {operation} failed with status {status}")]
    Api { operation: String, status: u16 },

    /// 시트(탭)를 찾을 수 없음
    #[error("Sheet \"{0}\" not found")]
    SheetNotFound(String),

    /// 네트워크 오류
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 잘못된 엔드포인트 URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SheetsError {
    pub fn api(operation: impl Into<String>, status: u16) -> Self {
        Self::Api {
            operation: operation.into(),
            status,
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetsError>;
