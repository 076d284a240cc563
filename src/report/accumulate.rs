use std::collections::HashMap;

use crate::label::{Metadata, term_label};
use crate::model::{ModelColumn, Parameter};
use crate::report::format::{format_optional, sig_stars};
use crate::report::{CREATED_LABEL, Cell, Grid, HEADER_LABEL, OMITTED_TEXT, ReportError};

#[derive(Debug, Clone)]
pub struct AccumulateOptions {
    /// Width of the model-column search window.
    pub max_models: usize,
    /// Decimals for coefficients and standard errors.
    pub scale: u32,
    /// Value written into the `created` row.
    pub created: String,
}

impl Default for AccumulateOptions {
    fn default() -> Self {
        Self {
            max_models: 1000,
            scale: 2,
            created: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    InsertRow(usize),
    Write { row: usize, col: usize, cell: Cell },
}

/// Ordered grid mutations for one model column. Row indices in each op refer
/// to the grid as left by the ops before it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPatch {
    pub column: usize,
    pub ops: Vec<PatchOp>,
    pub last_variable_row: usize,
}

impl SheetPatch {
    pub fn apply(&self, grid: &mut dyn Grid) {
        for op in &self.ops {
            match op {
                PatchOp::InsertRow(row) => grid.insert_row(*row),
                PatchOp::Write { row, col, cell } => grid.write(*row, *col, cell.clone()),
            }
        }
        grid.set_last_variable_row(self.last_variable_row);
    }

    pub fn inserted_rows(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PatchOp::InsertRow(_)))
            .count()
    }
}

/// Column-0 labels of the sheet as the plan sees them while it is being
/// built. Mirrors every insertion the plan emits.
struct RowIndex {
    labels: Vec<Option<String>>,
    by_label: HashMap<String, usize>,
}

impl RowIndex {
    fn read(grid: &dyn Grid) -> Result<Self, ReportError> {
        let labels: Vec<Option<String>> = (0..grid.row_count()).map(|r| grid.label(r)).collect();
        let mut by_label = HashMap::new();
        for (row, label) in labels.iter().enumerate().skip(1) {
            let Some(label) = label else { continue };
            if let Some(first) = by_label.insert(label.clone(), row) {
                return Err(ReportError::DuplicateLabel {
                    label: label.clone(),
                    first,
                    second: row,
                });
            }
        }
        Ok(Self { labels, by_label })
    }

    fn get(&self, label: &str) -> Option<usize> {
        self.by_label.get(label).copied()
    }

    fn is_free(&self, row: usize) -> bool {
        self.labels.get(row).is_none_or(Option::is_none)
    }

    fn insert_at(&mut self, row: usize) {
        if row < self.labels.len() {
            self.labels.insert(row, None);
        }
        for idx in self.by_label.values_mut() {
            if *idx >= row {
                *idx += 1;
            }
        }
    }

    fn claim(&mut self, row: usize, label: &str) {
        if self.labels.len() <= row {
            self.labels.resize(row + 1, None);
        }
        self.labels[row] = Some(label.to_string());
        self.by_label.insert(label.to_string(), row);
    }

    fn bottom(&self) -> usize {
        self.labels.len().saturating_sub(1)
    }
}

struct Planner<'a> {
    rows: RowIndex,
    ops: Vec<PatchOp>,
    column: usize,
    meta: &'a dyn Metadata,
    opts: &'a AccumulateOptions,
}

impl Planner<'_> {
    fn write(&mut self, row: usize, col: usize, cell: Cell) {
        self.ops.push(PatchOp::Write { row, col, cell });
    }

    fn claim(&mut self, row: usize, label: &str) {
        self.rows.claim(row, label);
        self.write(row, 0, Cell::text(label));
    }

    /// Existing row for `label`, or a new row appended below the used range.
    fn match_or_append(&mut self, label: &str) -> usize {
        if let Some(row) = self.rows.get(label) {
            return row;
        }
        let row = self.rows.bottom() + 1;
        self.claim(row, label);
        row
    }

    fn write_parameter(&mut self, row: usize, param: &Parameter) {
        if let Some(cell) = parameter_cell(param, self.opts.scale) {
            self.write(row, self.column, cell);
        }
    }
}

fn parameter_cell(param: &Parameter, scale: u32) -> Option<Cell> {
    if param.term.is_base() {
        return None;
    }
    if param.term.is_omitted() {
        return Some(Cell::right_text(OMITTED_TEXT));
    }
    let stars = param.p.map(sig_stars).unwrap_or("");
    Some(Cell::right_text(format!(
        "{}{} ({})",
        format_optional(param.coef, scale),
        stars,
        format_optional(param.se, scale)
    )))
}

fn find_column(grid: &dyn Grid, sheet: &str, max_models: usize) -> Result<usize, ReportError> {
    (1..=max_models)
        .find(|&col| grid.is_blank(0, col))
        .ok_or_else(|| ReportError::ColumnWindowExhausted {
            sheet: sheet.to_string(),
            max: max_models,
        })
}

/// Computes every mutation needed to add `model` as a new column without
/// touching the grid. Fails before anything is written.
pub fn plan_model(
    grid: &dyn Grid,
    sheet: &str,
    model: &ModelColumn,
    meta: &dyn Metadata,
    opts: &AccumulateOptions,
) -> Result<SheetPatch, ReportError> {
    let title = model.title.trim();
    if title.is_empty() {
        return Err(ReportError::EmptyTitle);
    }
    if model.params.is_empty() {
        return Err(ReportError::NoParameters(title.to_string()));
    }

    let column = find_column(grid, sheet, opts.max_models)?;
    let rows = RowIndex::read(grid)?;
    let mut plan = Planner {
        rows,
        ops: Vec::new(),
        column,
        meta,
        opts,
    };

    if grid.is_blank(0, 0) {
        plan.write(0, 0, Cell::text(HEADER_LABEL));
    }
    plan.write(0, column, Cell::text(title));

    let labeled: Vec<(String, &Parameter)> = model
        .params
        .iter()
        .map(|p| (term_label(&p.term, plan.meta), p))
        .collect();
    let (constants, variables): (Vec<_>, Vec<_>) =
        labeled.iter().partition(|(_, p)| p.term.is_constant());

    let marker = grid.last_variable_row().unwrap_or(0);
    // sheets written without a marker still keep new rows below matched ones
    let mut cursor = variables
        .iter()
        .filter_map(|(label, _)| plan.rows.get(label))
        .fold(marker, usize::max);

    for (label, param) in &variables {
        let row = match plan.rows.get(label) {
            Some(row) => row,
            None => {
                cursor += 1;
                if !plan.rows.is_free(cursor) {
                    crate::debug!("inserting row {} for {:?}", cursor, label);
                    plan.rows.insert_at(cursor);
                    plan.ops.push(PatchOp::InsertRow(cursor));
                }
                plan.claim(cursor, label);
                cursor
            }
        };
        plan.write_parameter(row, param);
    }
    let last_variable_row = marker.max(cursor);

    for (label, param) in &constants {
        let row = plan.match_or_append(label);
        plan.write_parameter(row, param);
    }

    for stat in &model.stats {
        let row = plan.match_or_append(&stat.label);
        if let Some(text) = stat.render() {
            plan.write(row, column, Cell::right_text(text));
        }
    }

    let row = plan.match_or_append(CREATED_LABEL);
    plan.write(row, column, Cell::text(opts.created.clone()));

    Ok(SheetPatch {
        column,
        ops: plan.ops,
        last_variable_row,
    })
}

/// Plans and applies one model column.
pub fn add_model(
    grid: &mut dyn Grid,
    sheet: &str,
    model: &ModelColumn,
    meta: &dyn Metadata,
    opts: &AccumulateOptions,
) -> Result<SheetPatch, ReportError> {
    let patch = plan_model(grid, sheet, model, meta, opts)?;
    patch.apply(grid);
    crate::info!(
        "sheet {}: added {:?} in column {} ({} rows inserted)",
        sheet,
        model.title,
        patch.column,
        patch.inserted_rows()
    );
    Ok(patch)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/accumulate.rs"]
mod tests;
