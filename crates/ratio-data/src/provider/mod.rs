//! 시세 Provider 모듈.
//!
//! ## Yahoo Finance
//! - `YahooQuoteFetcher`: v7 quote 엔드포인트, 실패 시 v8 chart 폴백
//!   (`1d/1m` → `5d/5m` → `1mo/1d`)
//!
//! ## Stooq
//! - `StooqCloseFetcher`: CSV 스냅샷(`q/l`), 실패 시 일봉 이력(`q/d/l`)

pub mod stooq;
pub mod yahoo;

pub use stooq::{parse_last_close, StooqCloseFetcher, StooqConfig};
pub use yahoo::{extract_chart_price, extract_quote_price, YahooConfig, YahooQuoteFetcher};

use async_trait::async_trait;
use chrono::Utc;
use ratio_core::{InvocationLog, Quote};
use reqwest::Url;

use crate::{DataError, Result};

/// 브라우저 User-Agent (일부 소스는 기본 UA를 차단함).
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// 시세 소스 trait.
///
/// 심볼 하나를 최신 가격 하나로 해석합니다.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 최신 가격 조회.
    ///
    /// # Errors
    /// 모든 엔드포인트가 실패하면 `DataError::QuoteUnavailable`.
    async fn fetch_price(&self, symbol: &str, log: &InvocationLog) -> Result<f64>;

    /// 가격을 심볼과 함께 `Quote`로 반환.
    async fn fetch_quote(&self, symbol: &str, log: &InvocationLog) -> Result<Quote> {
        let price = self.fetch_price(symbol, log).await?;
        Ok(Quote::new(symbol, price))
    }
}

/// 캐시 무효화용 `_` 쿼리 값 (epoch 밀리초 % 1,000,000).
pub fn cache_buster() -> String {
    (Utc::now().timestamp_millis() % 1_000_000).to_string()
}

/// 기본 URL에 경로 세그먼트를 붙입니다 (세그먼트는 퍼센트 인코딩됨).
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| DataError::InvalidUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| DataError::InvalidUrl(format!("{}: cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 요청마다 새 캐시 무효화 값을 붙인 URL.
pub(crate) fn with_cache_buster(url: &Url) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair("_", &cache_buster());
    url
}
