//! 수집 호출 흐름.
//!
//! 한 번의 호출은 다음 순서로 진행됩니다:
//! 1. 네 개의 시세를 동시에 조회 (하나라도 실패하면 전체 실패)
//! 2. 현재 시각의 추세선 적정 비율 계산
//! 3. 파생 지표 계산
//! 4. dry가 아니면 서비스 계정 인증 후 원장에 기록
//!
//! 호출 간 공유 상태는 없습니다. 원장을 기록하는 호출은 호출자가
//! 직렬화해야 합니다.

use chrono::{DateTime, Utc};
use ratio_core::{format_ledger_timestamp, DerivedMetrics, InvocationLog, LedgerRow, QuoteSet};
use ratio_data::{QuoteSource, StooqCloseFetcher, YahooQuoteFetcher};
use ratio_sheets::{GoogleSheetsClient, LedgerOutcome, LedgerWriter, ServiceAccount, ServiceAccountAuth};
use serde_json::json;

use crate::config::CollectorConfig;
use crate::error::{CollectorError, Result};
use crate::response::{FailureReport, InvocationResponse, PremiumReport};

/// 호출 옵션.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// 원장 기록 생략
    pub dry: bool,
    /// 수집한 로그를 응답에 포함
    pub verbose: bool,
}

/// 비율 수집기.
pub struct Collector {
    config: CollectorConfig,
    /// 주/보조 종목 시세 소스
    listed: Box<dyn QuoteSource>,
    /// 기준 자산 시세 소스
    reference: Box<dyn QuoteSource>,
}

impl Collector {
    /// Yahoo(종목)와 Stooq(기준 자산) 소스로 수집기 생성.
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let yahoo = YahooQuoteFetcher::new(config.endpoints.yahoo(), config.retry)?;
        let stooq = StooqCloseFetcher::new(config.endpoints.stooq(), config.retry)?;
        Ok(Self::with_sources(config, Box::new(yahoo), Box::new(stooq)))
    }

    pub fn with_sources(
        config: CollectorConfig,
        listed: Box<dyn QuoteSource>,
        reference: Box<dyn QuoteSource>,
    ) -> Self {
        Self {
            config,
            listed,
            reference,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// 한 번의 호출을 실행하고 응답 본문을 만듭니다.
    pub async fn invoke(&self, options: RunOptions) -> InvocationResponse {
        let log = self.config.capture.new_log();
        log.info(
            "request:start",
            json!({ "dry": options.dry, "verbose": options.verbose }),
        );

        match self.run(options, &log).await {
            Ok(mut report) => {
                let done = if options.dry { "request:dry_done" } else { "request:done" };
                log.info(done, None);
                if options.verbose {
                    report.logs = Some(log.into_lines());
                }
                InvocationResponse::Success(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Invocation failed");
                log.error("request:error", json!({ "error": e.to_string() }));
                let mut failure = FailureReport::new(e.to_string());
                if options.verbose {
                    failure.logs = Some(log.into_lines());
                }
                InvocationResponse::Failure(failure)
            }
        }
    }

    pub async fn run(&self, options: RunOptions, log: &InvocationLog) -> Result<PremiumReport> {
        self.run_at(Utc::now(), options, log).await
    }

    /// `at` 시각 기준으로 호출을 실행합니다.
    pub async fn run_at(
        &self,
        at: DateTime<Utc>,
        options: RunOptions,
        log: &InvocationLog,
    ) -> Result<PremiumReport> {
        log.info("fetch:prices:start", None);
        let quotes = self.fetch_quotes(log).await?;
        log.info(
            "fetch:prices:done",
            json!({
                "primary": quotes.primary.price,
                "primary_base": quotes.primary_base.price,
                "secondary": quotes.secondary.price,
                "secondary_base": quotes.secondary_base.price,
            }),
        );

        let fair_ratio = self.config.trend.fair_ratio_at(at);
        log.info(
            "calc:trend",
            json!({ "progress": self.config.trend.progress_at(at), "fair_ratio": fair_ratio }),
        );

        let metrics = DerivedMetrics::from_quotes(&quotes, fair_ratio);
        log.info(
            "calc:ratios",
            json!({ "spot_ratio": metrics.spot_ratio, "secondary_ratio": metrics.secondary_ratio }),
        );
        log.info(
            "calc:fair_and_premium",
            json!({
                "fair_price": metrics.fair_price,
                "premium_by_ratio": metrics.premium_by_ratio,
                "premium_by_price": metrics.premium_by_price,
            }),
        );

        let ts = format_ledger_timestamp(at, self.config.ledger.timezone);

        if options.dry {
            return Ok(PremiumReport::new(ts, &quotes, &metrics, true));
        }

        let row = LedgerRow::new(ts.clone(), &quotes, &metrics);
        let outcome = self.write_ledger(&row, log).await?;
        tracing::debug!(
            trimmed = outcome.trimmed_rows,
            colorized = outcome.colorized,
            "Ledger row recorded"
        );

        Ok(PremiumReport::new(ts, &quotes, &metrics, false))
    }

    /// 네 개의 시세를 동시에 조회.
    pub async fn fetch_quotes(&self, log: &InvocationLog) -> Result<QuoteSet> {
        let symbols = &self.config.instruments;
        let (primary, primary_base, secondary, secondary_base) = tokio::try_join!(
            self.listed.fetch_quote(&symbols.primary, log),
            self.reference.fetch_quote(&symbols.primary_base, log),
            self.listed.fetch_quote(&symbols.secondary, log),
            self.reference.fetch_quote(&symbols.secondary_base, log),
        )?;

        Ok(QuoteSet {
            primary,
            primary_base,
            secondary,
            secondary_base,
        })
    }

    async fn write_ledger(&self, row: &LedgerRow, log: &InvocationLog) -> Result<LedgerOutcome> {
        let target = self.config.ledger.target()?;
        let endpoints = &self.config.endpoints;

        let account = ServiceAccount::new(&target.client_email, &target.private_key);
        let auth = ServiceAccountAuth::new(account, &endpoints.google_token_url)
            .map_err(CollectorError::Authentication)?;
        let token = auth
            .fetch_token(log)
            .await
            .map_err(CollectorError::Authentication)?;

        let client = GoogleSheetsClient::new(&endpoints.sheets_api_url, &target.sheet_id, token)
            .map_err(CollectorError::LedgerWrite)?;
        let writer = LedgerWriter::new(client, &target.sheet_name, self.config.labels());

        writer
            .record(row, log)
            .await
            .map_err(CollectorError::LedgerWrite)
    }
}
