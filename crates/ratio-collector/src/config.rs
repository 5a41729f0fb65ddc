//! 수집기 설정.
//!
//! 환경변수(및 `.env`)에서 설정을 읽습니다. 원장 자격 증명은
//! 실제 기록이 필요할 때(dry가 아닌 호출)만 검사합니다.

use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use ratio_core::{CaptureLevel, CoreError, InstrumentLabels, InvocationLog, TrendConfig};
use ratio_data::{RetryPolicy, StooqConfig, YahooConfig};
use ratio_sheets::auth::DEFAULT_TOKEN_URL;
use ratio_sheets::client::DEFAULT_SHEETS_URL;
use secrecy::SecretString;

use crate::error::{CollectorError, Result};

/// 수집 대상 종목 심볼.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentConfig {
    /// 주 종목 (Yahoo)
    pub primary: String,
    /// 주 종목의 기준 자산 (Stooq)
    pub primary_base: String,
    /// 보조 종목 (Yahoo)
    pub secondary: String,
    /// 보조 종목의 기준 자산 (Stooq)
    pub secondary_base: String,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            primary: "GMSTR.IS".to_string(),
            primary_base: "XAGTRY".to_string(),
            secondary: "GLDTR.IS".to_string(),
            secondary_base: "XAUTRY".to_string(),
        }
    }
}

impl InstrumentConfig {
    pub fn labels(&self) -> InstrumentLabels {
        InstrumentLabels::from_symbols(
            &self.primary,
            &self.primary_base,
            &self.secondary,
            &self.secondary_base,
        )
    }
}

/// 원장 설정. 자격 증명은 선택값으로 보관합니다.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub sheet_id: Option<String>,
    pub sheet_name: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<SecretString>,
    /// 타임스탬프 표기 타임존
    pub timezone: Tz,
}

/// 기록에 필요한 값이 모두 갖춰진 원장 대상.
#[derive(Debug, Clone)]
pub struct LedgerTarget {
    pub sheet_id: String,
    pub sheet_name: String,
    pub client_email: String,
    pub private_key: SecretString,
}

impl LedgerConfig {
    /// 원장 기록 대상.
    ///
    /// # Errors
    /// 누락된 키가 있으면 모두 나열한 `CollectorError::Config`.
    pub fn target(&self) -> Result<LedgerTarget> {
        let mut missing = Vec::new();
        if self.sheet_id.is_none() {
            missing.push("SHEET_ID");
        }
        if self.sheet_name.is_none() {
            missing.push("SHEET_NAME");
        }
        if self.client_email.is_none() {
            missing.push("GOOGLE_CLIENT_EMAIL");
        }
        if self.private_key.is_none() {
            missing.push("GOOGLE_PRIVATE_KEY");
        }

        match (
            &self.sheet_id,
            &self.sheet_name,
            &self.client_email,
            &self.private_key,
        ) {
            (Some(sheet_id), Some(sheet_name), Some(client_email), Some(private_key)) => {
                Ok(LedgerTarget {
                    sheet_id: sheet_id.clone(),
                    sheet_name: sheet_name.clone(),
                    client_email: client_email.clone(),
                    private_key: private_key.clone(),
                })
            }
            _ => Err(CollectorError::Config(format!(
                "{} 환경변수가 설정되지 않았습니다",
                missing.join(", ")
            ))),
        }
    }
}

/// 외부 엔드포인트 기본 URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub yahoo_quote_url: String,
    pub yahoo_chart_url: String,
    pub stooq_url: String,
    pub google_token_url: String,
    pub sheets_api_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        let yahoo = YahooConfig::default();
        Self {
            yahoo_quote_url: yahoo.quote_base_url,
            yahoo_chart_url: yahoo.chart_base_url,
            stooq_url: StooqConfig::default().base_url,
            google_token_url: DEFAULT_TOKEN_URL.to_string(),
            sheets_api_url: DEFAULT_SHEETS_URL.to_string(),
        }
    }
}

impl EndpointConfig {
    /// 모든 엔드포인트를 같은 기본 URL로 지정 (테스트용 목 서버 등).
    pub fn all(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            yahoo_quote_url: base.to_string(),
            yahoo_chart_url: base.to_string(),
            stooq_url: base.to_string(),
            google_token_url: format!("{}/token", base),
            sheets_api_url: base.to_string(),
        }
    }

    pub fn yahoo(&self) -> YahooConfig {
        YahooConfig {
            quote_base_url: self.yahoo_quote_url.clone(),
            chart_base_url: self.yahoo_chart_url.clone(),
        }
    }

    pub fn stooq(&self) -> StooqConfig {
        StooqConfig {
            base_url: self.stooq_url.clone(),
        }
    }
}

/// 호출 로그 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub level: CaptureLevel,
    /// 수집한 라인을 tracing으로도 출력
    pub to_console: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            level: CaptureLevel::Info,
            to_console: true,
        }
    }
}

impl CaptureConfig {
    pub fn new_log(&self) -> InvocationLog {
        InvocationLog::new(self.level, self.to_console)
    }
}

/// HTTP 서버 바인드 주소.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 수집기 전체 설정.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub instruments: InstrumentConfig,
    pub trend: TrendConfig,
    pub ledger: LedgerConfig,
    pub endpoints: EndpointConfig,
    pub capture: CaptureConfig,
    pub retry: RetryPolicy,
    pub server: ServerConfig,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드.
    ///
    /// 빈 문자열은 설정되지 않은 것으로 간주합니다.
    ///
    /// # Errors
    /// 추세선 값이 숫자가 아니거나 검증에 실패하면, 또는 타임존을
    /// 알 수 없으면 `CollectorError::Config`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = InstrumentConfig::default();
        let instruments = InstrumentConfig {
            primary: env("YAHOO_SYMBOL").unwrap_or(defaults.primary),
            primary_base: env("PRIMARY_BASE_SYMBOL").unwrap_or(defaults.primary_base),
            secondary: env("SECONDARY_SYMBOL").unwrap_or(defaults.secondary),
            secondary_base: env("SECONDARY_BASE_SYMBOL").unwrap_or(defaults.secondary_base),
        };

        let trend = trend_from(&env)?;

        let timezone = match env("LEDGER_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| CoreError::UnknownTimezone(name.clone()))?,
            None => chrono_tz::Europe::Istanbul,
        };

        let ledger = LedgerConfig {
            sheet_id: env("SHEET_ID"),
            sheet_name: env("SHEET_NAME"),
            client_email: env("GOOGLE_CLIENT_EMAIL"),
            private_key: env("GOOGLE_PRIVATE_KEY").map(SecretString::from),
            timezone,
        };

        let endpoint_defaults = EndpointConfig::default();
        let endpoints = EndpointConfig {
            yahoo_quote_url: env("YAHOO_QUOTE_URL").unwrap_or(endpoint_defaults.yahoo_quote_url),
            yahoo_chart_url: env("YAHOO_CHART_URL").unwrap_or(endpoint_defaults.yahoo_chart_url),
            stooq_url: env("STOOQ_URL").unwrap_or(endpoint_defaults.stooq_url),
            google_token_url: env("GOOGLE_TOKEN_URL")
                .unwrap_or(endpoint_defaults.google_token_url),
            sheets_api_url: env("SHEETS_API_URL").unwrap_or(endpoint_defaults.sheets_api_url),
        };

        // info/debug 외의 값은 info로 취급
        let capture = CaptureConfig {
            level: env("LOG_LEVEL")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            to_console: env("LOG_TO_CONSOLE")
                .map(|v| v.trim() != "0")
                .unwrap_or(true),
        };

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy::new(
            env_var_parse(&env, "QUOTE_RETRY_MAX", retry_defaults.max_retries),
            Duration::from_millis(env_var_parse(
                &env,
                "QUOTE_RETRY_DELAY_MS",
                retry_defaults.base_delay.as_millis() as u64,
            )),
        );

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            host: env("API_HOST").unwrap_or(server_defaults.host),
            port: env_var_parse(&env, "API_PORT", server_defaults.port),
        };

        Ok(Self {
            instruments,
            trend,
            ledger,
            endpoints,
            capture,
            retry,
            server,
        })
    }

    pub fn labels(&self) -> InstrumentLabels {
        self.instruments.labels()
    }
}

fn trend_from<F>(env: &F) -> Result<TrendConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = TrendConfig::default();
    let trend = TrendConfig {
        start_date: match env("TREND_START_DATE") {
            Some(s) => TrendConfig::parse_date(&s)?,
            None => defaults.start_date,
        },
        start_value: env_var_strict(env, "TREND_START_VAL", defaults.start_value)?,
        end_date: match env("TREND_END_DATE") {
            Some(s) => TrendConfig::parse_date(&s)?,
            None => defaults.end_date,
        },
        end_value: env_var_strict(env, "TREND_END_VAL", defaults.end_value)?,
        total_bars: env_var_strict(env, "TREND_TOTAL_BARS", defaults.total_bars)?,
        day_to_bar: env_var_strict(env, "TREND_DAY2BAR_K", defaults.day_to_bar)?,
    };
    trend.validate()?;
    Ok(trend)
}

/// 값을 파싱하되 실패하면 기본값.
fn env_var_parse<F, T>(env: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    env(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 값을 파싱하고 실패하면 설정 오류.
fn env_var_strict<F, T>(env: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CollectorError::Config(format!("{} 값이 올바르지 않습니다: {}", key, raw))),
        None => Ok(default),
    }
}
