use std::path::Path;

use serde::Deserialize;

use crate::decode::decode;
use crate::label::{VariableCatalog, variable_label};
use crate::model::ModelError;
use crate::report::{Cell, CellStyle, Grid, HEADER_LABEL};

const DESC_HEADER: [&str; 5] = [HEADER_LABEL, "Mean", "Std. Dev.", "Min", "Max"];

/// Summary statistics of one variable as exported by the statistics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Summary {
    pub var: String,
    pub mean: Option<f64>,
    pub sd: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub metadata: VariableCatalog,
}

impl Summary {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Appends one descriptive row below the used range and returns its index.
pub fn append_summary(grid: &mut dyn Grid, summary: &Summary) -> usize {
    if grid.is_blank(0, 0) {
        for (col, title) in DESC_HEADER.iter().enumerate() {
            grid.write(0, col, Cell::text(*title));
        }
    }

    let row = grid.row_count().max(1);
    let label = variable_label(&decode(&summary.var), &summary.metadata);
    grid.write(row, 0, Cell::text(label));
    let values = [summary.mean, summary.sd, summary.min, summary.max];
    for (offset, value) in values.iter().enumerate() {
        if let Some(v) = value {
            grid.write(row, offset + 1, Cell::number(*v, CellStyle::TwoDecimal));
        }
    }
    row
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/describe.rs"]
mod tests;
