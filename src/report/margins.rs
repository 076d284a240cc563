use std::path::Path;

use serde::Deserialize;

use crate::model::{ModelError, present};
use crate::report::store::{SheetChoice, Workbook};
use crate::report::{Cell, Grid};

const MARGIN_HEADER: [&str; 4] = ["Margin", "Std. Err.", "z", "P>|z|"];

/// Predictive margins as exported by the statistics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Margins {
    /// Command line that produced the margins.
    #[serde(default)]
    pub cmdline: String,
    /// `r(table)`: one row per statistic (margin, se, z, p, ...), one column
    /// per margin.
    pub table: Vec<Vec<Option<f64>>>,
    /// `r(at)`: one row per margin, one column per `at` variable.
    pub at: Vec<Vec<Option<f64>>>,
    pub at_names: Vec<String>,
}

impl Margins {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        let margins: Margins = serde_json::from_str(&text)?;
        margins.validate()?;
        Ok(margins)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.table.len() < MARGIN_HEADER.len() {
            return Err(ModelError::MissingTableRows {
                needed: MARGIN_HEADER.len(),
                found: self.table.len(),
            });
        }
        let expected = self.table[0].len();
        for (row, values) in self.table.iter().enumerate() {
            if values.len() != expected {
                return Err(ModelError::TableWidth {
                    row,
                    found: values.len(),
                    expected,
                });
            }
        }
        if self.at.len() != expected {
            return Err(ModelError::MarginCount {
                found: self.at.len(),
                expected,
            });
        }
        for values in &self.at {
            if values.len() != self.at_names.len() {
                return Err(ModelError::MatrixShape {
                    name: "at",
                    found: values.len(),
                    expected: self.at_names.len(),
                });
            }
        }
        Ok(())
    }

    /// Indices of the `at` variables whose value changes between
    /// consecutive margins.
    pub fn varying(&self) -> Vec<usize> {
        (0..self.at_names.len())
            .filter(|&var| self.at.windows(2).any(|pair| pair[0].get(var) != pair[1].get(var)))
            .collect()
    }
}

/// Adds two new sheets: the margins table keyed by the varying `at`
/// variables, then the full `at` grid. Returns both sheet names.
pub fn append_margins(wb: &mut Workbook, margins: &Margins) -> (String, String) {
    let varying = margins.varying();
    crate::debug!("{} of {} at variables vary", varying.len(), margins.at_names.len());

    let idx = wb.select(&SheetChoice::New);
    write_margin_table(&mut wb.sheets[idx], margins, &varying);
    let table_sheet = wb.sheets[idx].name.clone();

    let idx = wb.select(&SheetChoice::New);
    write_at_grid(&mut wb.sheets[idx], margins);
    (table_sheet, wb.sheets[idx].name.clone())
}

pub fn write_margin_table(grid: &mut dyn Grid, margins: &Margins, varying: &[usize]) {
    if !margins.cmdline.trim().is_empty() {
        grid.write(0, 0, Cell::text(margins.cmdline.as_str()));
    }

    for (col, &var) in varying.iter().enumerate() {
        grid.write(1, col, Cell::text(margins.at_names[var].as_str()));
    }
    let offset = varying.len();
    for (stat, title) in MARGIN_HEADER.iter().enumerate() {
        grid.write(1, offset + stat, Cell::text(*title));
    }

    for (margin, at) in margins.at.iter().enumerate() {
        let row = margin + 2;
        for (col, &var) in varying.iter().enumerate() {
            write_value(grid, row, col, at.get(var).copied().flatten());
        }
        for stat in 0..MARGIN_HEADER.len() {
            let value = margins.table.get(stat).and_then(|r| r.get(margin)).copied().flatten();
            write_value(grid, row, offset + stat, value);
        }
    }
}

pub fn write_at_grid(grid: &mut dyn Grid, margins: &Margins) {
    for (col, name) in margins.at_names.iter().enumerate() {
        grid.write(0, col, Cell::text(name.as_str()));
    }
    for (margin, at) in margins.at.iter().enumerate() {
        for (col, value) in at.iter().enumerate() {
            write_value(grid, margin + 1, col, *value);
        }
    }
}

fn write_value(grid: &mut dyn Grid, row: usize, col: usize, value: Option<f64>) {
    if let Some(v) = value.and_then(present) {
        grid.write(row, col, Cell::raw_number(v));
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/margins.rs"]
mod tests;
