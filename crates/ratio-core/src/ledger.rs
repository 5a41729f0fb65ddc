//! 원장(스프레드시트) 행 구성.
//!
//! 열 구성 (A~J):
//!
//! | 열 | 내용 |
//! |---|---|
//! | A | 타임스탬프 |
//! | B | 주 종목 시세 (q1) |
//! | C | 주 기준 자산 시세 (q2) |
//! | D | 현재 비율 (%) |
//! | E | 비율 기준 프리미엄 (%) |
//! | F | 적정가 |
//! | G | 가격 기준 프리미엄 (%) |
//! | H | 보조 종목 시세 (q3) |
//! | I | 보조 기준 자산 시세 (q4) |
//! | J | 보조 비율 (%) |

use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;
use serde_json::{Number, Value};

use crate::{DerivedMetrics, QuoteSet};

/// 원장 열 수.
pub const LEDGER_COLUMNS: usize = 10;

/// 헤더에 표시할 종목 라벨.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentLabels {
    pub primary: String,
    pub primary_base: String,
    pub secondary: String,
    pub secondary_base: String,
}

impl Default for InstrumentLabels {
    fn default() -> Self {
        Self {
            primary: "GMSTR".to_string(),
            primary_base: "XAGTRY".to_string(),
            secondary: "GLDTR".to_string(),
            secondary_base: "XAUTRY".to_string(),
        }
    }
}

impl InstrumentLabels {
    /// 데이터 소스 심볼에서 라벨 생성 (거래소 접미사 제거, 대문자).
    ///
    /// `"GMSTR.IS"` → `"GMSTR"`, `"xagtry"` → `"XAGTRY"`
    pub fn from_symbols(
        primary: &str,
        primary_base: &str,
        secondary: &str,
        secondary_base: &str,
    ) -> Self {
        Self {
            primary: label_of(primary),
            primary_base: label_of(primary_base),
            secondary: label_of(secondary),
            secondary_base: label_of(secondary_base),
        }
    }

    /// 원장 헤더 행 (기존 시트 레이아웃 유지).
    pub fn header(&self) -> Vec<String> {
        vec![
            "Timestamp".to_string(),
            self.primary.clone(),
            self.primary_base.clone(),
            format!("{}/{} (%)", self.primary, self.primary_base),
            "% prim/iskonto (oran)".to_string(),
            format!("Adil {}", self.primary),
            "% prim/iskonto (fiyat)".to_string(),
            self.secondary.clone(),
            self.secondary_base.clone(),
            format!("{}/{} (%)", self.secondary, self.secondary_base),
        ]
    }
}

fn label_of(symbol: &str) -> String {
    symbol
        .split('.')
        .next()
        .unwrap_or(symbol)
        .to_uppercase()
}

/// 원장 한 행.
///
/// 원시 시세는 반올림하지 않고, 파생 지표는 반올림된 값을 기록합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub timestamp: String,
    pub primary: f64,
    pub primary_base: f64,
    pub secondary: f64,
    pub secondary_base: f64,
    /// 반올림된 파생 지표
    pub metrics: DerivedMetrics,
}

impl LedgerRow {
    pub fn new(timestamp: impl Into<String>, quotes: &QuoteSet, metrics: &DerivedMetrics) -> Self {
        Self {
            timestamp: timestamp.into(),
            primary: quotes.primary.price,
            primary_base: quotes.primary_base.price,
            secondary: quotes.secondary.price,
            secondary_base: quotes.secondary_base.price,
            metrics: metrics.rounded(),
        }
    }

    /// A~J 열 순서의 셀 값.
    ///
    /// 유한하지 않은 숫자는 `null`로 기록됩니다.
    pub fn cells(&self) -> Vec<Value> {
        vec![
            Value::String(self.timestamp.clone()),
            number_cell(self.primary),
            number_cell(self.primary_base),
            number_cell(self.metrics.spot_ratio),
            number_cell(self.metrics.premium_by_ratio),
            number_cell(self.metrics.fair_price),
            number_cell(self.metrics.premium_by_price),
            number_cell(self.secondary),
            number_cell(self.secondary_base),
            number_cell(self.metrics.secondary_ratio),
        ]
    }
}

fn number_cell(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// 원장 타임스탬프 형식: `dd.MM.yy HH:mm:ss GMT+3`.
pub fn format_ledger_timestamp(at: DateTime<Utc>, tz: Tz) -> String {
    let local = at.with_timezone(&tz);
    let offset_secs = local.offset().fix().local_minus_utc();
    format!(
        "{} {}",
        local.format("%d.%m.%y %H:%M:%S"),
        gmt_suffix(offset_secs)
    )
}

fn gmt_suffix(offset_secs: i32) -> String {
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.abs();
    let hours = abs / 3600;
    let minutes = (abs % 3600) / 60;
    if minutes == 0 {
        format!("GMT{}{}", sign, hours)
    } else {
        format!("GMT{}{}:{:02}", sign, hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quote;
    use chrono::TimeZone;

    fn sample_quotes() -> QuoteSet {
        QuoteSet {
            primary: Quote::new("GMSTR.IS", 50.0),
            primary_base: Quote::new("XAGTRY", 200.0),
            secondary: Quote::new("GLDTR.IS", 30.0),
            secondary_base: Quote::new("XAUTRY", 100.0),
        }
    }

    #[test]
    fn test_default_header() {
        let header = InstrumentLabels::default().header();
        assert_eq!(header.len(), LEDGER_COLUMNS);
        assert_eq!(header[0], "Timestamp");
        assert_eq!(header[3], "GMSTR/XAGTRY (%)");
        assert_eq!(header[5], "Adil GMSTR");
        assert_eq!(header[9], "GLDTR/XAUTRY (%)");
    }

    #[test]
    fn test_labels_from_symbols() {
        let labels = InstrumentLabels::from_symbols("GMSTR.IS", "xagtry", "GLDTR.IS", "XAUTRY");
        assert_eq!(labels, InstrumentLabels::default());
    }

    #[test]
    fn test_row_cells_order() {
        let metrics = DerivedMetrics::from_quotes(&sample_quotes(), 25.0);
        let row = LedgerRow::new("15.01.25 12:30:05 GMT+3", &sample_quotes(), &metrics);
        let cells = row.cells();

        assert_eq!(cells.len(), LEDGER_COLUMNS);
        assert_eq!(cells[0], Value::String("15.01.25 12:30:05 GMT+3".to_string()));
        assert_eq!(cells[1].as_f64(), Some(50.0));
        assert_eq!(cells[2].as_f64(), Some(200.0));
        assert_eq!(cells[3].as_f64(), Some(25.0));
        assert_eq!(cells[4].as_f64(), Some(0.0));
        assert_eq!(cells[5].as_f64(), Some(50.0));
        assert_eq!(cells[6].as_f64(), Some(0.0));
        assert_eq!(cells[7].as_f64(), Some(30.0));
        assert_eq!(cells[8].as_f64(), Some(100.0));
        assert_eq!(cells[9].as_f64(), Some(30.0));
    }

    #[test]
    fn test_non_finite_cell_is_null() {
        let metrics = DerivedMetrics::from_quotes(&sample_quotes(), 0.0);
        let row = LedgerRow::new("ts", &sample_quotes(), &metrics);
        assert_eq!(row.cells()[4], Value::Null);
    }

    #[test]
    fn test_format_ledger_timestamp_istanbul() {
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 5).unwrap();
        assert_eq!(
            format_ledger_timestamp(at, chrono_tz::Europe::Istanbul),
            "15.01.25 12:30:05 GMT+3"
        );
    }

    #[test]
    fn test_format_ledger_timestamp_other_zones() {
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 5).unwrap();
        assert_eq!(
            format_ledger_timestamp(at, chrono_tz::Asia::Kolkata),
            "15.01.25 15:00:05 GMT+5:30"
        );
        assert_eq!(
            format_ledger_timestamp(at, chrono_tz::America::New_York),
            "15.01.25 04:30:05 GMT-5"
        );
    }
}
