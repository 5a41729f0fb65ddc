//! Stooq CSV 종가 조회.
//!
//! 심볼은 소문자로 요청합니다. 스냅샷(`/q/l/`)을 먼저 시도하고,
//! 종가를 얻지 못하면 일봉 이력(`/q/d/l/`)에서 마지막 유효 종가를 사용합니다.

use std::time::Duration;

use async_trait::async_trait;
use ratio_core::{parse_locale_number, InvocationLog};
use reqwest::{Client, Url};
use serde_json::json;

use super::{endpoint, with_cache_buster, QuoteSource, BROWSER_USER_AGENT};
use crate::{DataError, Result, RetryPolicy};

/// Stooq 엔드포인트 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StooqConfig {
    pub base_url: String,
}

impl Default for StooqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://stooq.com".to_string(),
        }
    }
}

/// Stooq 종가 조회기.
pub struct StooqCloseFetcher {
    client: Client,
    config: StooqConfig,
    retry: RetryPolicy,
}

impl StooqCloseFetcher {
    pub fn new(config: StooqConfig, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// 스냅샷 URL: `/q/l/?s={sym}&f=sd2t2ohlcv&h&e=csv`
    fn snapshot_url(&self, symbol: &str) -> Result<Url> {
        let mut url = endpoint(&self.config.base_url, &["q", "l", ""])?;
        url.query_pairs_mut()
            .append_pair("s", symbol)
            .append_pair("f", "sd2t2ohlcv")
            .append_key_only("h")
            .append_pair("e", "csv");
        Ok(url)
    }

    /// 일봉 이력 URL: `/q/d/l/?s={sym}&i=d`
    fn history_url(&self, symbol: &str) -> Result<Url> {
        let mut url = endpoint(&self.config.base_url, &["q", "d", "l", ""])?;
        url.query_pairs_mut()
            .append_pair("s", symbol)
            .append_pair("i", "d");
        Ok(url)
    }
}

#[async_trait]
impl QuoteSource for StooqCloseFetcher {
    fn name(&self) -> &str {
        "stooq"
    }

    async fn fetch_price(&self, symbol: &str, log: &InvocationLog) -> Result<f64> {
        let lowered = symbol.to_lowercase();
        let urls = [self.snapshot_url(&lowered)?, self.history_url(&lowered)?];
        let mut last_status = None;

        for url in &urls {
            let response = match self
                .retry
                .send("stooq", log, || self.client.get(with_cache_buster(url)))
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    log.debug(
                        "stooq:transport_error",
                        json!({ "url": url.as_str(), "e": e.to_string() }),
                    );
                    continue;
                }
            };

            let status = response.status();
            last_status = Some(status.as_u16());
            if !status.is_success() {
                log.debug(
                    "stooq:res:not_ok",
                    json!({ "url": url.as_str(), "status": status.as_u16() }),
                );
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    log.debug("stooq:body_error", json!({ "url": url.as_str(), "e": e.to_string() }));
                    continue;
                }
            };

            if let Some(close) = parse_last_close(&body) {
                log.debug("stooq:ok", json!({ "symbol": symbol, "val": close }));
                return Ok(close);
            }
            log.debug("stooq:no_close", json!({ "url": url.as_str() }));
        }

        tracing::debug!(symbol, status = ?last_status, "Stooq sources exhausted");
        Err(DataError::QuoteUnavailable {
            symbol: symbol.to_string(),
            status: last_status,
        })
    }
}

/// CSV 본문에서 마지막 유효 종가를 찾습니다.
///
/// 빈 줄은 무시하고, 헤더에서 `close` 열을 대소문자 구분 없이 찾은 뒤
/// 마지막 행부터 거꾸로 첫 번째 유한한 숫자를 반환합니다.
/// 빈 셀과 `N/D` 같은 값은 건너뜁니다.
pub fn parse_last_close(body: &str) -> Option<f64> {
    let cleaned = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(cleaned.as_bytes());

    let close_idx = reader
        .headers()
        .ok()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("close"))?;

    let rows: Vec<csv::StringRecord> = reader.records().filter_map(|r| r.ok()).collect();
    rows.iter()
        .rev()
        .find_map(|row| row.get(close_idx).and_then(parse_locale_number))
}
