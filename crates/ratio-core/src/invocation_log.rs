//! 호출 단위 로그 수집.
//!
//! 한 번의 수집 호출 동안 발생한 로그 라인을 모아 두었다가
//! `verbose` 응답에 그대로 포함합니다. 전역 상태 없이 호출 체인에
//! 명시적으로 전달되며, 동시 시세 조회에서도 안전하도록 내부적으로
//! 뮤텍스로 보호됩니다.

use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 로그 라인 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Debug,
    Error,
}

/// 수집 레벨. `Info`에서는 debug 라인이 버려집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureLevel {
    #[default]
    Info,
    Debug,
}

impl FromStr for CaptureLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// 수집된 로그 한 줄.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// RFC 3339 타임스탬프
    pub ts: String,
    pub kind: LogKind,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// 호출 단위 로그.
#[derive(Debug, Default)]
pub struct InvocationLog {
    level: CaptureLevel,
    to_console: bool,
    lines: Mutex<Vec<LogLine>>,
}

impl InvocationLog {
    pub fn new(level: CaptureLevel, to_console: bool) -> Self {
        Self {
            level,
            to_console,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn level(&self) -> CaptureLevel {
        self.level
    }

    pub fn info(&self, msg: impl Into<String>, extra: impl Into<Option<Value>>) {
        self.push(LogKind::Info, msg.into(), extra.into());
    }

    pub fn debug(&self, msg: impl Into<String>, extra: impl Into<Option<Value>>) {
        if self.level != CaptureLevel::Debug {
            return;
        }
        self.push(LogKind::Debug, msg.into(), extra.into());
    }

    pub fn error(&self, msg: impl Into<String>, extra: impl Into<Option<Value>>) {
        self.push(LogKind::Error, msg.into(), extra.into());
    }

    /// 지금까지 수집된 라인의 사본.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_lines(self) -> Vec<LogLine> {
        self.lines.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, kind: LogKind, msg: String, extra: Option<Value>) {
        if self.to_console {
            let extra_text = extra.as_ref().map(Value::to_string).unwrap_or_default();
            match kind {
                LogKind::Info => tracing::info!(extra = %extra_text, "{}", msg),
                LogKind::Debug => tracing::debug!(extra = %extra_text, "{}", msg),
                LogKind::Error => tracing::error!(extra = %extra_text, "{}", msg),
            }
        }

        let line = LogLine {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            kind,
            msg,
            extra,
        };
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}
