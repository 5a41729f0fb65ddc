//! 선형 추세선 기반 적정 비율 모델.
//!
//! 차트에 그린 추세선의 두 제어점(시작값, 종료값) 사이를
//! 경과한 바(bar) 수에 따라 선형 보간합니다.
//!
//! # 단위
//!
//! 제어점 값은 퍼센트에 100을 곱한 값으로 설정합니다.
//! 예: `2238` → `22.38` (%)
//!
//! # 계산
//!
//! ```text
//! days  = (at - start_date 00:00Z) / 1일      (소수 허용)
//! bar   = days * day_to_bar
//! t     = clamp(bar / total_bars, 0, 1)
//! ratio = (start_value + (end_value - start_value) * t) / 100
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, Result};

/// 하루의 밀리초.
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 추세선 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// 추세선 시작일 (UTC 자정 기준)
    pub start_date: NaiveDate,
    /// 시작일의 값 (퍼센트 × 100)
    pub start_value: f64,
    /// 추세선 종료일 (참고용, 계산에는 사용되지 않음)
    pub end_date: NaiveDate,
    /// 종료 시점의 값 (퍼센트 × 100)
    pub end_value: f64,
    /// 시작~종료 구간의 총 바 수
    pub total_bars: f64,
    /// 달력일 → 바 환산 계수 (영업일 축 보정)
    pub day_to_bar: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2012, 4, 30).unwrap_or_default(),
            start_value: 2238.0,
            end_date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap_or_default(),
            end_value: 2022.0,
            total_bars: 3417.0,
            day_to_bar: 0.686558168,
        }
    }
}

impl TrendConfig {
    /// `YYYY-MM-DD` 형식의 날짜 파싱.
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| CoreError::InvalidDate(format!("{}: {}", s, e)))
    }

    /// 설정값 검증.
    ///
    /// # Errors
    /// `total_bars`, `day_to_bar`가 양수가 아니거나 값이 유한하지 않으면
    /// `CoreError::InvalidTrendConfig`를 반환합니다.
    pub fn validate(&self) -> Result<()> {
        if !self.start_value.is_finite() || !self.end_value.is_finite() {
            return Err(CoreError::InvalidTrendConfig(
                "start/end value must be finite".to_string(),
            ));
        }
        if !self.total_bars.is_finite() || self.total_bars <= 0.0 {
            return Err(CoreError::InvalidTrendConfig(format!(
                "total_bars must be > 0 (got {})",
                self.total_bars
            )));
        }
        if !self.day_to_bar.is_finite() || self.day_to_bar <= 0.0 {
            return Err(CoreError::InvalidTrendConfig(format!(
                "day_to_bar must be > 0 (got {})",
                self.day_to_bar
            )));
        }
        Ok(())
    }

    /// 주어진 시각의 진행률 `t` (0..=1).
    pub fn progress_at(&self, at: DateTime<Utc>) -> f64 {
        let start = self.start_date.and_time(NaiveTime::MIN).and_utc();
        let days = (at - start).num_milliseconds() as f64 / MILLIS_PER_DAY;
        let bar = days * self.day_to_bar;
        (bar / self.total_bars).clamp(0.0, 1.0)
    }

    /// 주어진 시각의 적정 비율 (%).
    pub fn fair_ratio_at(&self, at: DateTime<Utc>) -> f64 {
        let t = self.progress_at(at);
        let value = self.start_value + (self.end_value - self.start_value) * t;
        value / 100.0
    }

    /// 현재 시각의 적정 비율 (%).
    pub fn fair_ratio_now(&self) -> f64 {
        self.fair_ratio_at(Utc::now())
    }
}
