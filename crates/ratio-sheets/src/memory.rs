//! 인메모리 스프레드시트.
//!
//! `SpreadsheetApi`의 테스트용 구현입니다. 행 삽입/삭제, 배경색,
//! 값 읽기/쓰기를 Sheets와 같은 인덱스 규칙으로 흉내 내며,
//! [`MemoryFault`]로 특정 작업을 실패시킬 수 있습니다.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{A1Range, Color, SheetRequest, SpreadsheetApi};
use crate::{Result, SheetsError};

/// 주입 가능한 실패 지점.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryFault {
    SheetLookup,
    InsertRows,
    DeleteRows,
    RepeatCell,
    ReadRange,
    WriteRange,
}

#[derive(Debug, Clone, Default)]
struct MemoryRow {
    cells: Vec<Value>,
    backgrounds: BTreeMap<usize, Color>,
}

#[derive(Debug)]
struct MemorySheet {
    id: i64,
    title: String,
    rows: Vec<MemoryRow>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sheets: Vec<MemorySheet>,
    faults: HashSet<MemoryFault>,
    requests: Vec<SheetRequest>,
}

impl MemoryState {
    fn check(&self, fault: MemoryFault) -> Result<()> {
        if self.faults.contains(&fault) {
            return Err(SheetsError::api(format!("{:?}", fault), 500));
        }
        Ok(())
    }

    fn by_title(&mut self, title: &str) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| SheetsError::SheetNotFound(title.to_string()))
    }

    fn by_id(&mut self, id: i64) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SheetsError::SheetNotFound(id.to_string()))
    }
}

/// 인메모리 스프레드시트.
#[derive(Debug, Default)]
pub struct InMemorySpreadsheet {
    state: Mutex<MemoryState>,
}

impl InMemorySpreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빈 탭 추가.
    pub fn with_sheet(self, title: impl Into<String>, id: i64) -> Self {
        self.with_rows(title, id, Vec::new())
    }

    /// 값이 채워진 탭 추가.
    pub fn with_rows(mut self, title: impl Into<String>, id: i64, rows: Vec<Vec<Value>>) -> Self {
        let sheet = MemorySheet {
            id,
            title: title.into(),
            rows: rows
                .into_iter()
                .map(|cells| MemoryRow {
                    cells,
                    backgrounds: BTreeMap::new(),
                })
                .collect(),
        };
        self.state_mut().sheets.push(sheet);
        self
    }

    /// 해당 작업이 항상 실패하도록 설정.
    pub fn fail_on(mut self, fault: MemoryFault) -> Self {
        self.state_mut().faults.insert(fault);
        self
    }

    /// 탭의 전체 행 값 (없는 탭은 빈 목록).
    pub fn rows(&self, title: &str) -> Vec<Vec<Value>> {
        self.state()
            .sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.rows.iter().map(|r| r.cells.clone()).collect())
            .unwrap_or_default()
    }

    /// 셀 배경색 (0 기반 행/열).
    pub fn background(&self, title: &str, row: usize, column: usize) -> Option<Color> {
        self.state()
            .sheets
            .iter()
            .find(|s| s.title == title)
            .and_then(|s| s.rows.get(row))
            .and_then(|r| r.backgrounds.get(&column).copied())
    }

    /// 지금까지 받은 batchUpdate 요청.
    pub fn requests(&self) -> Vec<SheetRequest> {
        self.state().requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Sheets처럼 끝의 빈 셀과 빈 행을 잘라냅니다.
fn trim_trailing(mut rows: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    for row in rows.iter_mut() {
        while row.last().is_some_and(is_blank) {
            row.pop();
        }
    }
    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows
}

fn ensure_rows(rows: &mut Vec<MemoryRow>, len: usize) {
    if rows.len() < len {
        rows.resize_with(len, MemoryRow::default);
    }
}

#[async_trait]
impl SpreadsheetApi for InMemorySpreadsheet {
    async fn sheet_id(&self, sheet_name: &str) -> Result<i64> {
        let mut state = self.state();
        state.check(MemoryFault::SheetLookup)?;
        Ok(state.by_title(sheet_name)?.id)
    }

    async fn batch_update(&self, requests: Vec<SheetRequest>) -> Result<()> {
        let mut state = self.state();
        state.requests.extend(requests.iter().cloned());

        // 일괄 요청은 전부 적용되거나 전부 실패
        for request in &requests {
            let fault = match request {
                SheetRequest::InsertDimension(_) => MemoryFault::InsertRows,
                SheetRequest::DeleteDimension(_) => MemoryFault::DeleteRows,
                SheetRequest::RepeatCell(_) => MemoryFault::RepeatCell,
            };
            state.check(fault)?;
        }

        for request in requests {
            match request {
                SheetRequest::InsertDimension(req) => {
                    let sheet = state.by_id(req.range.sheet_id)?;
                    let start = req.range.start_index;
                    let count = req.range.end_index.saturating_sub(start);
                    ensure_rows(&mut sheet.rows, start);
                    let tail = sheet.rows.split_off(start);
                    sheet
                        .rows
                        .extend(std::iter::repeat_with(MemoryRow::default).take(count));
                    sheet.rows.extend(tail);
                }
                SheetRequest::DeleteDimension(req) => {
                    let sheet = state.by_id(req.range.sheet_id)?;
                    let end = req.range.end_index.min(sheet.rows.len());
                    let start = req.range.start_index.min(end);
                    sheet.rows.drain(start..end);
                }
                SheetRequest::RepeatCell(req) => {
                    let range = &req.range;
                    let color = req.cell.user_entered_format.background_color;
                    let sheet = state.by_id(range.sheet_id)?;
                    ensure_rows(&mut sheet.rows, range.end_row_index);
                    for row in &mut sheet.rows[range.start_row_index..range.end_row_index] {
                        for column in range.start_column_index..range.end_column_index {
                            row.backgrounds.insert(column, color);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn read_range(&self, range: &A1Range) -> Result<Vec<Vec<Value>>> {
        let mut state = self.state();
        state.check(MemoryFault::ReadRange)?;
        let sheet = state.by_title(&range.sheet)?;

        let (first, last) = range.rows.unwrap_or((1, sheet.rows.len()));
        let values = sheet
            .rows
            .iter()
            .skip(first.saturating_sub(1))
            .take((last + 1).saturating_sub(first))
            .map(|row| {
                (range.start_column..=range.end_column)
                    .map(|c| row.cells.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(trim_trailing(values))
    }

    async fn write_range(&self, range: &A1Range, rows: Vec<Vec<Value>>) -> Result<()> {
        let mut state = self.state();
        state.check(MemoryFault::WriteRange)?;
        let sheet = state.by_title(&range.sheet)?;

        let first = range.rows.map(|(first, _)| first).unwrap_or(1);
        ensure_rows(&mut sheet.rows, first - 1 + rows.len());
        for (offset, values) in rows.into_iter().enumerate() {
            let cells = &mut sheet.rows[first - 1 + offset].cells;
            let needed = range.start_column + values.len();
            if cells.len() < needed {
                cells.resize(needed, Value::Null);
            }
            for (i, value) in values.into_iter().enumerate() {
                cells[range.start_column + i] = value;
            }
        }
        Ok(())
    }
}
