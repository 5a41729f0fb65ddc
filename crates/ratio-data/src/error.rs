//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 시세 조회 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 모든 소스에서 시세를 얻지 못함
    #[error("Quote unavailable for {symbol}{}", status_suffix(.status))]
    QuoteUnavailable {
        symbol: String,
        /// 마지막으로 관측된 HTTP 상태 코드 (응답을 한 번도 받지 못했으면 `None`)
        status: Option<u16>,
    },

    /// HTTP 클라이언트 오류
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 잘못된 엔드포인트 URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (last status {})", code),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_unavailable_message() {
        let err = DataError::QuoteUnavailable {
            symbol: "GMSTR.IS".to_string(),
            status: Some(429),
        };
        assert_eq!(err.to_string(), "Quote unavailable for GMSTR.IS (last status 429)");

        let err = DataError::QuoteUnavailable {
            symbol: "XAGTRY".to_string(),
            status: None,
        };
        assert_eq!(err.to_string(), "Quote unavailable for XAGTRY");
    }
}
