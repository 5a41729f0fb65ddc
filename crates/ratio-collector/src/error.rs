//! 에러 타입 정의.

use std::fmt;

use ratio_core::CoreError;
use ratio_data::DataError;
use ratio_sheets::SheetsError;

/// Collector 에러 타입. 모두 호출 실패로 이어집니다.
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 시세를 얻지 못함
    QuoteUnavailable(DataError),
    /// 서비스 계정 인증 실패
    Authentication(SheetsError),
    /// 원장 기록 실패
    LedgerWrite(SheetsError),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::QuoteUnavailable(e) => write!(f, "{}", e),
            Self::Authentication(e) => write!(f, "{}", e),
            Self::LedgerWrite(e) => write!(f, "Ledger write failed: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::QuoteUnavailable(e) => Some(e),
            Self::Authentication(e) | Self::LedgerWrite(e) => Some(e),
        }
    }
}

impl From<DataError> for CollectorError {
    fn from(err: DataError) -> Self {
        Self::QuoteUnavailable(err)
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
