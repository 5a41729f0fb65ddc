//! 프로세스 로깅 초기화.
//!
//! `tracing-subscriber` 레지스트리에 `EnvFilter`와 fmt 레이어 하나를 올립니다.
//! 출력 형식은 `LOG_FORMAT`(pretty/json/compact)으로 고릅니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 레벨만 지정했을 때 필터를 적용할 워크스페이스 크레이트.
const WORKSPACE_TARGETS: [&str; 4] = ["ratio_core", "ratio_data", "ratio_sheets", "ratio_collector"];

/// 콘솔 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 여러 줄, 색상 (로컬 실행)
    #[default]
    Pretty,
    /// 한 줄 JSON (수집기/배포 환경)
    Json,
    /// 한 줄 텍스트
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 레벨 또는 EnvFilter 지시문 (`"debug"`, `"info,ratio_data=trace"`)
    pub level: String,
    pub format: LogFormat,
    /// 소스 파일/줄 번호 표시
    pub with_file: bool,
    /// 모듈 경로 표시
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_file: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// `LOG_LEVEL`, `LOG_FORMAT`에서 설정을 읽습니다. 잘못된 형식은 기본값.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.level = level;
        }
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|s| s.parse().ok()) {
            config.format = format;
        }
        config
    }

    /// EnvFilter 지시문.
    ///
    /// `"debug"`처럼 레벨만 주어지면 워크스페이스 크레이트에만 적용하고
    /// 나머지(hyper, reqwest 등)는 `warn`으로 둡니다.
    pub fn filter_directive(&self) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            return level.to_string();
        }
        WORKSPACE_TARGETS
            .iter()
            .fold(String::from("warn"), |mut acc, target| {
                acc.push_str(&format!(",{}={}", target, level));
                acc
            })
    }
}

/// 전역 subscriber 설치.
///
/// `RUST_LOG`가 있으면 설정의 레벨보다 우선합니다. 이미 설치되어 있으면 오류.
///
/// ```no_run
/// use ratio_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directive())?,
    };

    let layer = fmt::layer()
        .with_file(config.with_file)
        .with_line_number(config.with_file)
        .with_target(config.with_target);
    let layer = match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}
