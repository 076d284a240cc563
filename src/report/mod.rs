pub mod accumulate;
pub mod describe;
pub mod format;
pub mod margins;
pub mod sheet;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sheet::Sheet;

pub const HEADER_LABEL: &str = "Variables";
pub const CREATED_LABEL: &str = "created";
pub const OMITTED_TEXT: &str = "0 (omitted)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    RightText,
    TwoDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            style: None,
        }
    }

    pub fn right_text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            style: Some(CellStyle::RightText),
        }
    }

    pub fn number(value: f64, style: CellStyle) -> Self {
        Self {
            value: CellValue::Number(value),
            style: Some(style),
        }
    }

    pub fn raw_number(value: f64) -> Self {
        Self {
            value: CellValue::Number(value),
            style: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match &self.value {
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

/// Storage-agnostic view of one report sheet.
pub trait Grid {
    fn cell(&self, row: usize, col: usize) -> Option<&Cell>;
    /// Number of rows in the used range (last used row index + 1).
    fn row_count(&self) -> usize;
    fn write(&mut self, row: usize, col: usize, cell: Cell);
    /// Inserts an empty row at `row`; the row previously there and everything
    /// below move down by one.
    fn insert_row(&mut self, row: usize);
    fn last_variable_row(&self) -> Option<usize>;
    fn set_last_variable_row(&mut self, row: usize);

    fn is_blank(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_none_or(Cell::is_blank)
    }

    fn label(&self, row: usize) -> Option<String> {
        let cell = self.cell(row, 0)?;
        if cell.is_blank() {
            return None;
        }
        match &cell.value {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("sheet {sheet}: no free model column within the first {max} columns")]
    ColumnWindowExhausted { sheet: String, max: usize },
    #[error("duplicate row label {label:?} at rows {first} and {second}")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },
    #[error("model title is empty")]
    EmptyTitle,
    #[error("model {0:?} has no parameters")]
    NoParameters(String),
}
