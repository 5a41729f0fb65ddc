//! Google Sheets 원장 기록.
//!
//! 이 crate는 다음을 제공합니다:
//! - 서비스 계정 인증 (RS256 JWT-bearer → 접근 토큰)
//! - Sheets v4 REST 클라이언트 (`SpreadsheetApi` 구현)
//! - 원장 기록기: 헤더 보장, 2행 삽입, 200행 유지, 전일 대비 색상 표시
//! - 테스트용 인메모리 스프레드시트 (`test-utils` feature)

pub mod api;
pub mod auth;
pub mod client;
pub mod colorize;
pub mod error;
pub mod ledger;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use api::{
    A1Range, CellData, CellFormat, Color, DeleteDimensionRequest, Dimension, DimensionRange,
    GridRange, InsertDimensionRequest, RepeatCellRequest, SheetRequest, SpreadsheetApi,
};
pub use auth::{AccessToken, AssertionClaims, ServiceAccount, ServiceAccountAuth};
pub use client::GoogleSheetsClient;
pub use colorize::{cell_number, color_requests, compare_delta, premium_sign, DeltaColor};
pub use error::{Result, SheetsError};
pub use ledger::{LedgerOutcome, LedgerWriter, MAX_LEDGER_ROWS};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{InMemorySpreadsheet, MemoryFault};
