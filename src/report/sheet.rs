use serde::{Deserialize, Serialize};

use crate::report::{Cell, Grid};

/// In-memory sheet. Rows are stored densely; trailing cells of a row may be
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_variable_row: Option<usize>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_variable_row: None,
            rows: Vec::new(),
        }
    }
}

impl Grid for Sheet {
    fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn write(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = Some(cell);
    }

    fn insert_row(&mut self, row: usize) {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, Vec::new);
        } else {
            self.rows.insert(row, Vec::new());
        }
        if let Some(marker) = self.last_variable_row
            && marker >= row
        {
            self.last_variable_row = Some(marker + 1);
        }
    }

    fn last_variable_row(&self) -> Option<usize> {
        self.last_variable_row
    }

    fn set_last_variable_row(&mut self, row: usize) {
        self.last_variable_row = Some(row);
    }
}
