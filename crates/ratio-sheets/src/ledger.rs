//! 원장 기록기.
//!
//! 기록 순서:
//! 1. 헤더(1행) 보장
//! 2. 2행 앞에 빈 행 삽입 후 새 행 기록
//! 3. 전체 행이 201을 넘으면 마지막 행 삭제
//! 4. 2행과 3행을 비교해 색상 표시
//!
//! 1~2단계 실패는 호출 전체 실패이고, 3~4단계 실패는 로그만 남깁니다.
//! 부분적으로 기록된 상태는 되돌리지 않습니다.
//!
//! 동시 호출 간 잠금은 없으므로 호출자가 기록 호출을 직렬화해야 합니다.

use ratio_core::{InstrumentLabels, InvocationLog, LedgerRow, LEDGER_COLUMNS};
use serde_json::{json, Value};

use crate::api::{
    A1Range, DeleteDimensionRequest, DimensionRange, InsertDimensionRequest, SheetRequest,
    SpreadsheetApi,
};
use crate::colorize::color_requests;
use crate::Result;

/// 헤더 포함 최대 행 수 (데이터 200행).
pub const MAX_LEDGER_ROWS: usize = 201;

/// 기록 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerOutcome {
    /// 삭제된 행 수
    pub trimmed_rows: usize,
    /// 색상 표시 적용 여부
    pub colorized: bool,
}

/// 스프레드시트 원장 기록기.
pub struct LedgerWriter<A: SpreadsheetApi> {
    api: A,
    sheet_name: String,
    labels: InstrumentLabels,
}

impl<A: SpreadsheetApi> LedgerWriter<A> {
    pub fn new(api: A, sheet_name: impl Into<String>, labels: InstrumentLabels) -> Self {
        Self {
            api,
            sheet_name: sheet_name.into(),
            labels,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// 새 행을 원장 맨 위(2행)에 기록합니다.
    ///
    /// # Errors
    /// 헤더 기록, 시트 조회, 행 삽입/기록 중 하나라도 실패하면 오류를 반환합니다.
    pub async fn record(&self, row: &LedgerRow, log: &InvocationLog) -> Result<LedgerOutcome> {
        self.ensure_header().await?;

        let sheet_id = self.api.sheet_id(&self.sheet_name).await?;

        log.info("sheets:insertRow2:start", None);
        self.insert_row(sheet_id, row, log).await?;
        log.info("sheets:insertRow2:done", None);

        let trimmed_rows = match self.trim(sheet_id).await {
            Ok(deleted) => {
                if deleted > 0 {
                    log.debug("sheets:trim:ok", json!({ "deleted": deleted }));
                }
                deleted
            }
            Err(e) => {
                tracing::warn!(error = %e, sheet = %self.sheet_name, "Ledger trim skipped");
                log.error("sheets:trim:failed", json!({ "error": e.to_string() }));
                0
            }
        };

        log.info("sheets:colorize:start", None);
        let colorized = match self.colorize(sheet_id).await {
            Ok(applied) => {
                if applied {
                    log.debug("sheets:colorize:ok", None);
                }
                applied
            }
            Err(e) => {
                tracing::warn!(error = %e, sheet = %self.sheet_name, "Ledger colouring skipped");
                log.error("sheets:colorize:failed", json!({ "error": e.to_string() }));
                false
            }
        };
        log.info("sheets:colorize:done", None);

        Ok(LedgerOutcome {
            trimmed_rows,
            colorized,
        })
    }

    /// 1행에 헤더 기록 (기존 값을 덮어씀).
    async fn ensure_header(&self) -> Result<()> {
        let header: Vec<Value> = self
            .labels
            .header()
            .into_iter()
            .map(Value::String)
            .collect();
        self.api
            .write_range(&A1Range::rows(&self.sheet_name, 1, 1, LEDGER_COLUMNS), vec![header])
            .await
    }

    async fn insert_row(&self, sheet_id: i64, row: &LedgerRow, log: &InvocationLog) -> Result<()> {
        self.api
            .batch_update(vec![SheetRequest::InsertDimension(InsertDimensionRequest {
                range: DimensionRange::rows(sheet_id, 1, 2),
                inherit_from_before: false,
            })])
            .await?;
        log.debug("sheets:insertRow2:insertDimension.ok", None);

        self.api
            .write_range(
                &A1Range::rows(&self.sheet_name, 2, 2, LEDGER_COLUMNS),
                vec![row.cells()],
            )
            .await?;
        log.debug("sheets:insertRow2:writeRow.ok", None);
        Ok(())
    }

    /// A열 행 수가 한도를 넘으면 마지막 행 하나를 삭제합니다.
    async fn trim(&self, sheet_id: i64) -> Result<usize> {
        let count = self
            .api
            .read_range(&A1Range::column(&self.sheet_name, 0))
            .await?
            .len();
        if count <= MAX_LEDGER_ROWS {
            return Ok(0);
        }

        self.api
            .batch_update(vec![SheetRequest::DeleteDimension(DeleteDimensionRequest {
                range: DimensionRange::rows(sheet_id, count - 1, count),
            })])
            .await?;
        Ok(1)
    }

    async fn colorize(&self, sheet_id: i64) -> Result<bool> {
        let rows = self
            .api
            .read_range(&A1Range::rows(&self.sheet_name, 2, 3, LEDGER_COLUMNS))
            .await?;
        let [current, previous, ..] = rows.as_slice() else {
            return Ok(false);
        };

        self.api
            .batch_update(color_requests(sheet_id, current, previous))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorize::DeltaColor;
    use crate::memory::{InMemorySpreadsheet, MemoryFault};
    use ratio_core::{CaptureLevel, DerivedMetrics, Quote, QuoteSet};

    const SHEET: &str = "Ledger";

    fn row(ts: &str, primary: f64) -> LedgerRow {
        let quotes = QuoteSet {
            primary: Quote::new("GMSTR.IS", primary),
            primary_base: Quote::new("XAGTRY", 200.0),
            secondary: Quote::new("GLDTR.IS", 30.0),
            secondary_base: Quote::new("XAUTRY", 100.0),
        };
        let metrics = DerivedMetrics::from_quotes(&quotes, 25.0);
        LedgerRow::new(ts, &quotes, &metrics)
    }

    fn data_row(i: usize) -> Vec<Value> {
        vec![json!(format!("old-{}", i)), json!(40.0), json!(200.0)]
    }

    fn log() -> InvocationLog {
        InvocationLog::new(CaptureLevel::Debug, false)
    }

    fn header() -> Vec<Value> {
        InstrumentLabels::default()
            .header()
            .into_iter()
            .map(Value::String)
            .collect()
    }

    #[tokio::test]
    async fn test_record_on_empty_sheet() {
        let sheet = InMemorySpreadsheet::new().with_sheet(SHEET, 7);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());

        let outcome = writer.record(&row("t1", 50.0), &log()).await.unwrap();

        assert_eq!(outcome, LedgerOutcome { trimmed_rows: 0, colorized: false });
        let rows = sheet.rows(SHEET);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], header());
        assert_eq!(rows[1], row("t1", 50.0).cells());
    }

    #[tokio::test]
    async fn test_newest_row_first_and_header_unchanged() {
        let sheet = InMemorySpreadsheet::new().with_sheet(SHEET, 7);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());

        writer.record(&row("t1", 50.0), &log()).await.unwrap();
        let outcome = writer.record(&row("t2", 60.0), &log()).await.unwrap();

        assert!(outcome.colorized);
        let rows = sheet.rows(SHEET);
        assert_eq!(rows[0], header());
        assert_eq!(rows[1][0], json!("t2"));
        assert_eq!(rows[2][0], json!("t1"));

        // 60 > 50 → 증가, 기준 자산은 동일 → 중립
        assert_eq!(sheet.background(SHEET, 1, 1), Some(DeltaColor::Increase.color()));
        assert_eq!(sheet.background(SHEET, 1, 2), Some(DeltaColor::Neutral.color()));
        // 이전 행(3행)은 색상 변경 없음
        assert_eq!(sheet.background(SHEET, 2, 1), None);
    }

    #[tokio::test]
    async fn test_trim_keeps_201_rows() {
        let mut rows = vec![header()];
        rows.extend((0..200).map(data_row));
        let sheet = InMemorySpreadsheet::new().with_rows(SHEET, 7, rows);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());

        let outcome = writer.record(&row("new", 50.0), &log()).await.unwrap();

        assert_eq!(outcome.trimmed_rows, 1);
        let rows = sheet.rows(SHEET);
        assert_eq!(rows.len(), MAX_LEDGER_ROWS);
        assert_eq!(rows[0], header());
        assert_eq!(rows[1][0], json!("new"));
        assert_eq!(rows[200][0], json!("old-198"));
    }

    #[tokio::test]
    async fn test_no_trim_at_limit() {
        let mut rows = vec![header()];
        rows.extend((0..199).map(data_row));
        let sheet = InMemorySpreadsheet::new().with_rows(SHEET, 7, rows);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());

        let outcome = writer.record(&row("new", 50.0), &log()).await.unwrap();

        assert_eq!(outcome.trimmed_rows, 0);
        assert_eq!(sheet.rows(SHEET).len(), MAX_LEDGER_ROWS);
    }

    #[tokio::test]
    async fn test_trim_and_colorize_failures_are_not_fatal() {
        let mut rows = vec![header()];
        rows.extend((0..200).map(data_row));
        let sheet = InMemorySpreadsheet::new()
            .with_rows(SHEET, 7, rows)
            .fail_on(MemoryFault::DeleteRows)
            .fail_on(MemoryFault::RepeatCell);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());
        let log = log();

        let outcome = writer.record(&row("new", 50.0), &log).await.unwrap();

        assert_eq!(outcome, LedgerOutcome::default());
        assert_eq!(sheet.rows(SHEET).len(), 202);
        let errors: Vec<String> = log
            .lines()
            .into_iter()
            .filter(|l| l.kind == ratio_core::LogKind::Error)
            .map(|l| l.msg)
            .collect();
        assert_eq!(errors, vec!["sheets:trim:failed", "sheets:colorize:failed"]);
    }

    #[tokio::test]
    async fn test_insert_failure_is_fatal() {
        let sheet = InMemorySpreadsheet::new()
            .with_sheet(SHEET, 7)
            .fail_on(MemoryFault::InsertRows);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());

        assert!(writer.record(&row("t1", 50.0), &log()).await.is_err());
        // 헤더는 이미 기록됨 (되돌리지 않음)
        assert_eq!(sheet.rows(SHEET), vec![header()]);
    }

    #[tokio::test]
    async fn test_missing_tab_is_fatal() {
        let sheet = InMemorySpreadsheet::new().with_sheet("Other", 1);
        let writer = LedgerWriter::new(&sheet, SHEET, InstrumentLabels::default());

        let err = writer.record(&row("t1", 50.0), &log()).await.unwrap_err();
        assert!(matches!(err, crate::SheetsError::SheetNotFound(name) if name == SHEET));
    }
}
