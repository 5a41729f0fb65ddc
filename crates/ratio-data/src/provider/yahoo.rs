//! Yahoo Finance 시세 조회.
//!
//! ## 조회 순서
//! 1. `/v7/finance/quote?symbols=…` 에서 `regularMarketPrice`,
//!    `postMarketPrice`, `preMarketPrice` 순으로 첫 숫자 값
//! 2. 실패 시 `/v8/finance/chart/{symbol}` 를 `1d/1m` → `5d/5m` → `1mo/1d` 순으로 시도
//!    (`meta.regularMarketPrice` 우선, 없으면 마지막 유효 종가)
//!
//! ## 사용 예시
//! ```rust,ignore
//! let fetcher = YahooQuoteFetcher::new(YahooConfig::default(), RetryPolicy::default())?;
//! let price = fetcher.fetch_price("GMSTR.IS", &log).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use ratio_core::InvocationLog;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Url};
use serde_json::{json, Value};

use super::{endpoint, with_cache_buster, QuoteSource, BROWSER_USER_AGENT};
use crate::{DataError, Result, RetryPolicy};

/// 차트 폴백 (range, interval) 순서.
const CHART_VARIANTS: [(&str, &str); 3] = [("1d", "1m"), ("5d", "5m"), ("1mo", "1d")];

/// quote 응답에서 확인하는 가격 필드 (우선순위 순).
const QUOTE_PRICE_FIELDS: [&str; 3] = ["regularMarketPrice", "postMarketPrice", "preMarketPrice"];

/// Yahoo 엔드포인트 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooConfig {
    /// v7 quote 기본 URL
    pub quote_base_url: String,
    /// v8 chart 기본 URL
    pub chart_base_url: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            quote_base_url: "https://query2.finance.yahoo.com".to_string(),
            chart_base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

/// Yahoo Finance 시세 조회기.
pub struct YahooQuoteFetcher {
    client: Client,
    config: YahooConfig,
    retry: RetryPolicy,
}

impl YahooQuoteFetcher {
    pub fn new(config: YahooConfig, retry: RetryPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://finance.yahoo.com/"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// GET 후 2xx이면 JSON 본문을 반환합니다.
    ///
    /// 전송 오류, 2xx 외 상태, JSON 파싱 실패는 모두 `None`이며
    /// 응답을 받았다면 `last_status`를 갱신합니다.
    async fn get_json(
        &self,
        label: &str,
        url: &Url,
        log: &InvocationLog,
        last_status: &mut Option<u16>,
    ) -> Option<Value> {
        let response = match self
            .retry
            .send(label, log, || self.client.get(with_cache_buster(url)))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log.debug(format!("{}:transport_error", label), json!({ "e": e.to_string() }));
                return None;
            }
        };

        let status = response.status();
        *last_status = Some(status.as_u16());
        if !status.is_success() {
            log.debug(format!("{}:fail", label), json!({ "status": status.as_u16() }));
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => Some(body),
            Err(e) => {
                log.debug(format!("{}:json_error", label), json!({ "e": e.to_string() }));
                None
            }
        }
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteFetcher {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_price(&self, symbol: &str, log: &InvocationLog) -> Result<f64> {
        let mut last_status = None;

        let mut quote_url = endpoint(&self.config.quote_base_url, &["v7", "finance", "quote"])?;
        quote_url.query_pairs_mut().append_pair("symbols", symbol);

        if let Some(body) = self
            .get_json("yahoo:quote", &quote_url, log, &mut last_status)
            .await
        {
            if let Some(price) = extract_quote_price(&body) {
                log.debug("yahoo:quote:ok", json!({ "symbol": symbol, "price": price }));
                return Ok(price);
            }
            log.debug("yahoo:quote:no_price", json!({ "symbol": symbol }));
        }

        let chart_url = endpoint(
            &self.config.chart_base_url,
            &["v8", "finance", "chart", symbol],
        )?;

        for (range, interval) in CHART_VARIANTS {
            let mut url = chart_url.clone();
            url.query_pairs_mut()
                .append_pair("range", range)
                .append_pair("interval", interval)
                .append_pair("corsDomain", "finance.yahoo.com");

            let Some(body) = self
                .get_json("yahoo:chart", &url, log, &mut last_status)
                .await
            else {
                continue;
            };

            if let Some(price) = extract_chart_price(&body) {
                log.debug(
                    "yahoo:chart:ok",
                    json!({ "symbol": symbol, "range": range, "interval": interval, "price": price }),
                );
                return Ok(price);
            }
            log.debug(
                "yahoo:chart:no_price",
                json!({ "symbol": symbol, "range": range, "interval": interval }),
            );
        }

        tracing::debug!(symbol, status = ?last_status, "Yahoo sources exhausted");
        Err(DataError::QuoteUnavailable {
            symbol: symbol.to_string(),
            status: last_status,
        })
    }
}

/// v7 quote 응답에서 가격 추출.
pub fn extract_quote_price(body: &Value) -> Option<f64> {
    let item = body.pointer("/quoteResponse/result/0")?;
    QUOTE_PRICE_FIELDS
        .iter()
        .find_map(|field| item.get(*field).and_then(Value::as_f64))
}

/// v8 chart 응답에서 가격 추출.
pub fn extract_chart_price(body: &Value) -> Option<f64> {
    let result = body.pointer("/chart/result/0")?;
    if let Some(price) = result
        .pointer("/meta/regularMarketPrice")
        .and_then(Value::as_f64)
    {
        return Some(price);
    }
    result
        .pointer("/indicators/quote/0/close")?
        .as_array()?
        .iter()
        .rev()
        .find_map(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_quote_price_priority() {
        let body = json!({
            "quoteResponse": { "result": [{ "regularMarketPrice": 12.5, "preMarketPrice": 11.0 }] }
        });
        assert_eq!(extract_quote_price(&body), Some(12.5));

        let body = json!({
            "quoteResponse": { "result": [{ "regularMarketPrice": null, "postMarketPrice": 12.7 }] }
        });
        assert_eq!(extract_quote_price(&body), Some(12.7));
    }

    #[test]
    fn test_extract_quote_price_missing() {
        assert_eq!(extract_quote_price(&json!({ "quoteResponse": { "result": [] } })), None);
        assert_eq!(
            extract_quote_price(&json!({ "quoteResponse": { "result": [{ "regularMarketPrice": "12" }] } })),
            None
        );
        assert_eq!(extract_quote_price(&json!({ "finance": { "error": "Unauthorized" } })), None);
    }

    #[test]
    fn test_extract_chart_price_prefers_meta() {
        let body = json!({
            "chart": { "result": [{
                "meta": { "regularMarketPrice": 101.25 },
                "indicators": { "quote": [{ "close": [99.0, 100.0] }] }
            }]}
        });
        assert_eq!(extract_chart_price(&body), Some(101.25));
    }

    #[test]
    fn test_extract_chart_price_scans_closes_backwards() {
        let body = json!({
            "chart": { "result": [{
                "meta": {},
                "indicators": { "quote": [{ "close": [99.0, 100.5, null, null] }] }
            }]}
        });
        assert_eq!(extract_chart_price(&body), Some(100.5));

        let empty = json!({ "chart": { "result": [{ "meta": {}, "indicators": { "quote": [{ "close": [null] }] } }] } });
        assert_eq!(extract_chart_price(&empty), None);
        assert_eq!(extract_chart_price(&json!({ "chart": { "result": null } })), None);
    }
}
