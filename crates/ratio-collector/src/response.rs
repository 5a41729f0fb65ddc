//! 호출 응답 본문.
//!
//! 유한하지 않은 숫자(0으로 나눈 프리미엄 등)는 JSON `null`로 직렬화됩니다.

use axum::http::StatusCode;
use ratio_core::{DerivedMetrics, LogLine, QuoteSet};
use serde::Serialize;

/// 성공 응답.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PremiumReport {
    pub ok: bool,
    /// dry 호출일 때만 `true`로 포함
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry: Option<bool>,
    /// 원장 타임존 기준 타임스탬프
    pub ts: String,
    pub primary: f64,
    pub primary_base: f64,
    pub secondary: f64,
    pub secondary_base: f64,
    /// 반올림된 파생 지표
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogLine>>,
}

impl PremiumReport {
    pub fn new(ts: impl Into<String>, quotes: &QuoteSet, metrics: &DerivedMetrics, dry: bool) -> Self {
        Self {
            ok: true,
            dry: dry.then_some(true),
            ts: ts.into(),
            primary: quotes.primary.price,
            primary_base: quotes.primary_base.price,
            secondary: quotes.secondary.price,
            secondary_base: quotes.secondary_base.price,
            metrics: metrics.rounded(),
            logs: None,
        }
    }
}

/// 실패 응답.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogLine>>,
}

impl FailureReport {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
            logs: None,
        }
    }
}

/// 호출 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvocationResponse {
    Success(PremiumReport),
    Failure(FailureReport),
}

impl InvocationResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Failure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 들여쓰기된 JSON 본문.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Response serialization failed");
            format!("{{\"ok\": false, \"error\": \"{}\"}}", e.to_string().replace('"', "'"))
        })
    }
}
