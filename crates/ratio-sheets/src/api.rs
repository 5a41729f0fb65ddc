//! Sheets v4 요청 타입과 `SpreadsheetApi` trait.
//!
//! batchUpdate 요청은 API의 JSON 형식(camelCase, 외부 태그)으로 직렬화됩니다:
//!
//! ```text
//! {"insertDimension": {"range": {"sheetId": 0, "dimension": "ROWS", "startIndex": 1, "endIndex": 2}, "inheritFromBefore": false}}
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// A1 표기 범위.
///
/// 열은 0부터, 행은 1부터 시작합니다 (Sheets 표기와 동일).
/// 시트 이름은 항상 작은따옴표로 감쌉니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    pub start_column: usize,
    pub end_column: usize,
    /// 포함 범위 (첫 행, 마지막 행). `None`이면 열 전체.
    pub rows: Option<(usize, usize)>,
}

impl A1Range {
    /// `first_row..=last_row` 행의 처음 `columns`개 열.
    pub fn rows(sheet: impl Into<String>, first_row: usize, last_row: usize, columns: usize) -> Self {
        Self {
            sheet: sheet.into(),
            start_column: 0,
            end_column: columns.saturating_sub(1),
            rows: Some((first_row, last_row)),
        }
    }

    /// 열 하나 전체 (예: `A:A`).
    pub fn column(sheet: impl Into<String>, column: usize) -> Self {
        Self {
            sheet: sheet.into(),
            start_column: column,
            end_column: column,
            rows: None,
        }
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sheet = self.sheet.replace('\'', "''");
        let start = column_letter(self.start_column);
        let end = column_letter(self.end_column);
        match self.rows {
            Some((first, last)) => write!(f, "'{}'!{}{}:{}{}", sheet, start, first, end, last),
            None => write!(f, "'{}'!{}:{}", sheet, start, end),
        }
    }
}

/// 0 기반 열 번호 → 열 문자 (`0` → `A`, `26` → `AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// 행/열 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dimension {
    Rows,
    Columns,
}

/// 행 또는 열 범위 (0 기반, 끝 미포함).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    pub start_index: usize,
    pub end_index: usize,
}

impl DimensionRange {
    pub fn rows(sheet_id: i64, start_index: usize, end_index: usize) -> Self {
        Self {
            sheet_id,
            dimension: Dimension::Rows,
            start_index,
            end_index,
        }
    }
}

/// 셀 격자 범위 (0 기반, 끝 미포함).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: usize,
    pub end_row_index: usize,
    pub start_column_index: usize,
    pub end_column_index: usize,
}

/// RGB 색상 (각 성분 0..=1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: f64::from(red) / 255.0,
            green: f64::from(green) / 255.0,
            blue: f64::from(blue) / 255.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    pub background_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_format: CellFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDimensionRequest {
    pub range: DimensionRange,
    pub inherit_from_before: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDimensionRequest {
    pub range: DimensionRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatCellRequest {
    pub range: GridRange,
    pub cell: CellData,
    pub fields: String,
}

impl RepeatCellRequest {
    /// 셀 배경색만 변경하는 요청.
    pub fn background(range: GridRange, color: Color) -> Self {
        Self {
            range,
            cell: CellData {
                user_entered_format: CellFormat {
                    background_color: color,
                },
            },
            fields: "userEnteredFormat.backgroundColor".to_string(),
        }
    }
}

/// batchUpdate 요청 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetRequest {
    InsertDimension(InsertDimensionRequest),
    DeleteDimension(DeleteDimensionRequest),
    RepeatCell(RepeatCellRequest),
}

/// 스프레드시트 백엔드.
///
/// 실제 구현은 [`crate::GoogleSheetsClient`], 테스트는 인메모리 구현을 사용합니다.
#[async_trait]
pub trait SpreadsheetApi: Send + Sync {
    /// 탭 이름으로 숫자 `sheetId` 조회.
    async fn sheet_id(&self, sheet_name: &str) -> Result<i64>;

    /// 구조 변경 요청 일괄 실행.
    async fn batch_update(&self, requests: Vec<SheetRequest>) -> Result<()>;

    /// 범위 값 읽기 (행 단위, 끝의 빈 셀/행은 생략될 수 있음).
    async fn read_range(&self, range: &A1Range) -> Result<Vec<Vec<Value>>>;

    /// 범위 값 쓰기 (`USER_ENTERED`).
    async fn write_range(&self, range: &A1Range, rows: Vec<Vec<Value>>) -> Result<()>;
}

#[async_trait]
impl<T: SpreadsheetApi + ?Sized> SpreadsheetApi for &T {
    async fn sheet_id(&self, sheet_name: &str) -> Result<i64> {
        (**self).sheet_id(sheet_name).await
    }

    async fn batch_update(&self, requests: Vec<SheetRequest>) -> Result<()> {
        (**self).batch_update(requests).await
    }

    async fn read_range(&self, range: &A1Range) -> Result<Vec<Vec<Value>>> {
        (**self).read_range(range).await
    }

    async fn write_range(&self, range: &A1Range, rows: Vec<Vec<Value>>) -> Result<()> {
        (**self).write_range(range, rows).await
    }
}
