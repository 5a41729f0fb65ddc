//! 시세 데이터 수집.
//!
//! 이 crate는 다음을 제공합니다:
//! - `QuoteSource` trait: 심볼 하나를 가격 하나로 해석하는 시세 소스
//! - Yahoo Finance 시세 조회 (v7 quote → v8 chart 폴백)
//! - Stooq CSV 종가 조회 (스냅샷 → 일봉 이력 폴백)
//! - HTTP 429 재시도 정책

pub mod error;
pub mod provider;
pub mod retry;

pub use error::{DataError, Result};
pub use provider::{
    QuoteSource, StooqCloseFetcher, StooqConfig, YahooConfig, YahooQuoteFetcher,
};
pub use retry::RetryPolicy;
