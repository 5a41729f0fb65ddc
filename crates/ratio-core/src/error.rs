//! 핵심 도메인 오류 타입.

use thiserror::Error;

/// 도메인 설정/검증 오류.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 추세선 설정값이 유효하지 않음
    #[error("Invalid trend config: {0}")]
    InvalidTrendConfig(String),

    /// 날짜 파싱 실패
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// 알 수 없는 타임존
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
