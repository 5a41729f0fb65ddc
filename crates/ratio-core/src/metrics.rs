//! 시세 및 파생 지표.
//!
//! 두 시세 쌍(주 종목/기준 자산, 보조 종목/기준 자산)과 추세선의 적정 비율로
//! 현재 비율, 적정가, 프리미엄/디스카운트를 계산합니다.
//!
//! 내부 계산은 전체 부동소수점 정밀도를 사용하고,
//! 외부 출력 직전에만 [`DerivedMetrics::rounded`]로 소수점 4자리 반올림합니다.
//! 적정 비율/적정가가 0이면 프리미엄은 무한대/NaN이 되며 그대로 전달됩니다.

use serde::{Deserialize, Serialize};

/// 단일 종목 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 데이터 소스 심볼 (예: "GMSTR.IS", "XAGTRY")
    pub symbol: String,
    /// 최종가
    pub price: f64,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

/// 한 번의 호출에서 수집하는 네 개의 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSet {
    /// 주 종목 (q1)
    pub primary: Quote,
    /// 주 종목의 기준 자산 (q2)
    pub primary_base: Quote,
    /// 보조 종목 (q3)
    pub secondary: Quote,
    /// 보조 종목의 기준 자산 (q4)
    pub secondary_base: Quote,
}

/// 파생 지표.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// 현재 비율 (q1 / q2 × 100)
    pub spot_ratio: f64,
    /// 추세선 적정 비율 (%)
    pub fair_ratio: f64,
    /// 적정가 (fair_ratio / 100 × q2)
    pub fair_price: f64,
    /// 비율 기준 프리미엄 (%)
    pub premium_by_ratio: f64,
    /// 가격 기준 프리미엄 (%)
    pub premium_by_price: f64,
    /// 보조 비율 (q3 / q4 × 100)
    pub secondary_ratio: f64,
}

impl DerivedMetrics {
    /// 네 개의 가격과 적정 비율로 지표 계산.
    pub fn compute(q1: f64, q2: f64, q3: f64, q4: f64, fair_ratio: f64) -> Self {
        let spot_ratio = q1 / q2 * 100.0;
        let secondary_ratio = q3 / q4 * 100.0;
        let fair_price = fair_ratio / 100.0 * q2;
        let premium_by_ratio = (spot_ratio - fair_ratio) / fair_ratio * 100.0;
        let premium_by_price = (q1 - fair_price) / fair_price * 100.0;

        Self {
            spot_ratio,
            fair_ratio,
            fair_price,
            premium_by_ratio,
            premium_by_price,
            secondary_ratio,
        }
    }

    /// 시세 묶음으로 지표 계산.
    pub fn from_quotes(quotes: &QuoteSet, fair_ratio: f64) -> Self {
        Self::compute(
            quotes.primary.price,
            quotes.primary_base.price,
            quotes.secondary.price,
            quotes.secondary_base.price,
            fair_ratio,
        )
    }

    /// 모든 값을 소수점 4자리로 반올림한 사본.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            spot_ratio: round4(self.spot_ratio),
            fair_ratio: round4(self.fair_ratio),
            fair_price: round4(self.fair_price),
            premium_by_ratio: round4(self.premium_by_ratio),
            premium_by_price: round4(self.premium_by_price),
            secondary_ratio: round4(self.secondary_ratio),
        }
    }
}

/// 소수점 4자리 반올림 (유한하지 않은 값은 그대로).
pub fn round4(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value * 10_000.0).round() / 10_000.0
}

/// 로케일 숫자 문자열 파싱.
///
/// 첫 번째 쉼표를 소수점으로 간주합니다 (`"22,35"` → `22.35`).
/// 빈 문자열, 숫자가 아닌 값, 유한하지 않은 값은 `None`.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
