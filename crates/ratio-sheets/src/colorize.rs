//! 새 행(2행)의 전일 대비 색상 규칙.
//!
//! - 가격/비율 열 (B, C, D, H, I, J): 현재 > 이전이면 증가(초록),
//!   현재 < 이전이면 감소(빨강), 같거나 어느 한쪽이 숫자가 아니면 중립(노랑)
//! - 프리미엄 열 (E, G): 음수면 증가(초록), 양수면 감소(빨강), 0 또는 숫자가 아니면 중립

use ratio_core::parse_locale_number;
use serde_json::Value;

use crate::api::{Color, GridRange, RepeatCellRequest, SheetRequest};

/// 전일 비교 대상 열 (B, C, D, H, I, J).
pub const TREND_COLUMNS: [usize; 6] = [1, 2, 3, 7, 8, 9];

/// 부호로 판단하는 프리미엄 열 (E, G).
pub const PREMIUM_COLUMNS: [usize; 2] = [4, 6];

/// 색상 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaColor {
    Increase,
    Decrease,
    Neutral,
}

impl DeltaColor {
    pub fn color(self) -> Color {
        match self {
            Self::Increase => Color::from_rgb(199, 233, 192), // #C7E9C0
            Self::Decrease => Color::from_rgb(253, 205, 197), // #FDCDC5
            Self::Neutral => Color::from_rgb(255, 255, 204),  // #FFFFCC
        }
    }
}

/// 셀 값을 숫자로 해석합니다.
///
/// 숫자는 그대로, 문자열은 첫 쉼표를 소수점으로 바꿔 파싱합니다.
/// 빈 문자열, 불리언, `null`은 숫자가 아닙니다.
pub fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_locale_number(s),
        _ => None,
    }
}

/// 현재 값과 이전 값 비교.
pub fn compare_delta(current: Option<f64>, previous: Option<f64>) -> DeltaColor {
    match (current, previous) {
        (Some(cur), Some(prev)) if cur > prev => DeltaColor::Increase,
        (Some(cur), Some(prev)) if cur < prev => DeltaColor::Decrease,
        _ => DeltaColor::Neutral,
    }
}

/// 프리미엄 부호 판단 (음수 = 적정가 대비 할인 = 증가 색).
pub fn premium_sign(current: Option<f64>) -> DeltaColor {
    match current {
        Some(v) if v < 0.0 => DeltaColor::Increase,
        Some(v) if v > 0.0 => DeltaColor::Decrease,
        _ => DeltaColor::Neutral,
    }
}

/// 2행(0 기반 1행) 색상 변경 요청 8개.
///
/// `current`는 A2:J2, `previous`는 A3:J3 값입니다 (짧은 행은 빈 셀로 취급).
pub fn color_requests(sheet_id: i64, current: &[Value], previous: &[Value]) -> Vec<SheetRequest> {
    let cell = |row: &[Value], idx: usize| row.get(idx).and_then(cell_number);

    let trend = TREND_COLUMNS
        .iter()
        .map(|&col| (col, compare_delta(cell(current, col), cell(previous, col))));
    let premium = PREMIUM_COLUMNS
        .iter()
        .map(|&col| (col, premium_sign(cell(current, col))));

    trend
        .chain(premium)
        .map(|(col, delta)| {
            SheetRequest::RepeatCell(RepeatCellRequest::background(
                GridRange {
                    sheet_id,
                    start_row_index: 1,
                    end_row_index: 2,
                    start_column_index: col,
                    end_column_index: col + 1,
                },
                delta.color(),
            ))
        })
        .collect()
}
