pub mod families;
pub mod matrix;
pub mod stats;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::decode::Term;
use crate::label::{VariableCatalog, variable_label};
use families::{EquationLayout, EquationMatch, EquationName, FamilyDef, StatDef, StatSource};
use matrix::{Stage, check_len, check_square, quantile_parameters, vector_parameters};
pub use stats::ModelStat;

/// Smallest value the statistics engine uses for its missing codes.
pub const ENGINE_MISSING: f64 = 8.988_465_674_311_579e307;

const ROW_ESTIMATE: usize = 0;
const ROW_STD_ERROR: usize = 1;
const ROW_P_VALUE: usize = 3;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid estimation JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("estimation has no parameter columns")]
    NoColumns,
    #[error("results table needs at least {needed} rows, found {found}")]
    MissingTableRows { needed: usize, found: usize },
    #[error("results table row {row} has {found} entries, expected {expected}")]
    TableWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("{found} equation names for {expected} parameter columns")]
    EquationCount { found: usize, expected: usize },
    #[error("estimation has no {0} matrix")]
    MissingMatrix(&'static str),
    #[error("matrix {name} has {found} entries where {expected} are expected")]
    MatrixShape {
        name: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("{found} `at` rows for {expected} margins")]
    MarginCount { found: usize, expected: usize },
}

/// Results of one estimation as exported by the statistics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Estimation {
    pub cmd: String,
    pub depvar: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub equations: Option<Vec<String>>,
    /// `r(table)`: estimate, standard error, statistic and p-value rows.
    #[serde(default)]
    pub table: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub scalars: HashMap<String, Option<f64>>,
    #[serde(default)]
    pub metadata: VariableCatalog,
    /// `e(b)` for families estimated from the coefficient vector.
    #[serde(default)]
    pub b: Option<Vec<Option<f64>>>,
    /// `e(V)`, block diagonal over quantiles for `coefmat` families.
    #[serde(default, rename = "V")]
    pub v: Option<Vec<Vec<Option<f64>>>>,
    /// `e(coefmat)`: one row per column name, one column per quantile.
    #[serde(default)]
    pub coefmat: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub quantiles: Vec<f64>,
    #[serde(default)]
    pub sum_mdev: Vec<Option<f64>>,
    #[serde(default)]
    pub sum_rdev: Vec<Option<f64>>,
    /// `e(first)` keyed by instrumented variable, then statistic name.
    #[serde(default)]
    pub first: HashMap<String, HashMap<String, Option<f64>>>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Estimation {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        let estimation: Estimation = serde_json::from_str(&text)?;
        estimation.validate()?;
        Ok(estimation)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let expected = self.columns.len();
        if expected == 0 {
            return Err(ModelError::NoColumns);
        }
        match families::family_for(&self.cmd).equations {
            EquationLayout::Stages => self.validate_stages(),
            EquationLayout::Quantiles => self.validate_quantiles(),
            _ => self.validate_table(),
        }
    }

    fn validate_table(&self) -> Result<(), ModelError> {
        let expected = self.columns.len();
        if self.table.len() <= ROW_P_VALUE {
            return Err(ModelError::MissingTableRows {
                needed: ROW_P_VALUE + 1,
                found: self.table.len(),
            });
        }
        for (row, values) in self.table.iter().enumerate() {
            if values.len() != expected {
                return Err(ModelError::TableWidth {
                    row,
                    found: values.len(),
                    expected,
                });
            }
        }
        if let Some(eqs) = &self.equations
            && eqs.len() != expected
        {
            return Err(ModelError::EquationCount {
                found: eqs.len(),
                expected,
            });
        }
        Ok(())
    }

    fn validate_stages(&self) -> Result<(), ModelError> {
        let k = self.columns.len();
        let b = self.b.as_ref().ok_or(ModelError::MissingMatrix("b"))?;
        let v = self.v.as_ref().ok_or(ModelError::MissingMatrix("V"))?;
        check_len("b", b.len(), k)?;
        check_square("V", v, k)?;
        self.stages.iter().try_for_each(|stage| stage.coefs.validate())
    }

    fn validate_quantiles(&self) -> Result<(), ModelError> {
        let k = self.columns.len();
        let q = self.quantiles.len();
        let coefmat = self
            .coefmat
            .as_ref()
            .ok_or(ModelError::MissingMatrix("coefmat"))?;
        let v = self.v.as_ref().ok_or(ModelError::MissingMatrix("V"))?;
        check_len("coefmat", coefmat.len(), k)?;
        coefmat
            .iter()
            .try_for_each(|row| check_len("coefmat", row.len(), q))?;
        check_square("V", v, k * q)
    }

    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.scalars.get(key).copied().flatten().and_then(present)
    }

    fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.table
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .flatten()
            .and_then(present)
    }

    pub fn parameter(&self, col: usize) -> Parameter {
        Parameter {
            term: Term::parse(&self.columns[col]),
            coef: self.value(ROW_ESTIMATE, col),
            se: self.value(ROW_STD_ERROR, col),
            p: self.value(ROW_P_VALUE, col),
        }
    }

    fn equation_of(&self, col: usize) -> Option<&str> {
        self.equations
            .as_ref()
            .and_then(|eqs| eqs.get(col))
            .map(String::as_str)
    }

    pub fn depvar_label(&self) -> String {
        variable_label(&crate::decode::decode(&self.depvar), &self.metadata)
    }

    fn first_stage(&self, equation: &str, key: &str) -> Option<f64> {
        self.first
            .get(equation)
            .and_then(|stats| stats.get(key))
            .copied()
            .flatten()
            .and_then(present)
    }

    fn deviation_r2(&self, idx: usize) -> Option<f64> {
        let abs = self.sum_mdev.get(idx).copied().flatten().and_then(present);
        let raw = self.sum_rdev.get(idx).copied().flatten().and_then(present);
        pseudo_r2(abs, raw)
    }
}

fn pseudo_r2(abs: Option<f64>, raw: Option<f64>) -> Option<f64> {
    match (abs, raw) {
        (Some(a), Some(r)) if r != 0.0 => Some(1.0 - a / r),
        _ => None,
    }
}

pub(crate) fn present(v: f64) -> Option<f64> {
    if v.is_nan() || v >= ENGINE_MISSING {
        None
    } else {
        Some(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub term: Term,
    pub coef: Option<f64>,
    pub se: Option<f64>,
    pub p: Option<f64>,
}

/// One report column: a single-equation model or one equation of a
/// multi-equation model.
#[derive(Debug, Clone)]
pub struct ModelColumn {
    pub title: String,
    pub params: Vec<Parameter>,
    pub stats: Vec<ModelStat>,
}

pub fn build_columns(estimation: &Estimation) -> Vec<ModelColumn> {
    let family = families::family_for(&estimation.cmd);
    let depvar_label = estimation.depvar_label();
    let model_stats = resolve_stats(estimation, family.model_stats, None);

    let equations = equation_params(estimation, family);
    if equations.is_empty() {
        return vec![single_column(estimation, depvar_label, model_stats)];
    }

    let mut out = Vec::with_capacity(equations.len());
    for (idx, (eq, params)) in equations.into_iter().enumerate() {
        if params.is_empty() {
            crate::warn!("equation {} has no parameters; skipping", eq);
            continue;
        }

        let eq_defs: Vec<StatDef> = family
            .equation_stats
            .iter()
            .filter(|def| match def.equation {
                EquationMatch::Any => true,
                EquationMatch::Named(name) => resolve_equation(estimation, name) == eq,
                EquationMatch::Instrumented => eq != estimation.depvar,
            })
            .map(|def| def.stat)
            .collect();
        let mut stats = resolve_stats(estimation, &eq_defs, Some((idx + 1, eq.as_str())));
        stats.extend(model_stats.iter().cloned());

        out.push(ModelColumn {
            title: format!("{} ({})", depvar_label, eq),
            params,
            stats,
        });
    }

    if out.is_empty() {
        crate::warn!("no equation matched any parameter column; reporting a single column");
        out.push(single_column(estimation, depvar_label, model_stats));
    }
    out
}

fn single_column(
    estimation: &Estimation,
    title: String,
    stats: Vec<ModelStat>,
) -> ModelColumn {
    let params = (0..estimation.columns.len())
        .map(|col| estimation.parameter(col))
        .collect();
    ModelColumn {
        title,
        params,
        stats,
    }
}

/// Equation names with their parameters, in report order. Empty for
/// single-equation models.
fn equation_params(estimation: &Estimation, family: &FamilyDef) -> Vec<(String, Vec<Parameter>)> {
    let df_r = estimation.scalar("df_r");
    match family.equations {
        EquationLayout::Stages => {
            let mut out: Vec<(String, Vec<Parameter>)> = estimation
                .stages
                .iter()
                .map(|stage| (stage.equation.clone(), stage.coefs.parameters()))
                .collect();
            let b = estimation.b.as_deref().unwrap_or_default();
            let v = estimation.v.as_deref().unwrap_or_default();
            out.push((
                estimation.depvar.clone(),
                vector_parameters(&estimation.columns, b, v, df_r),
            ));
            out
        }
        EquationLayout::Quantiles => {
            let coefmat = estimation.coefmat.as_deref().unwrap_or_default();
            let v = estimation.v.as_deref().unwrap_or_default();
            estimation
                .quantiles
                .iter()
                .enumerate()
                .map(|(q, level)| {
                    (
                        format!("Q={level}"),
                        quantile_parameters(&estimation.columns, coefmat, v, q, df_r),
                    )
                })
                .collect()
        }
        _ => equation_names(estimation, family)
            .into_iter()
            .map(|eq| {
                let params = (0..estimation.columns.len())
                    .filter(|&col| estimation.equation_of(col) == Some(eq.as_str()))
                    .map(|col| estimation.parameter(col))
                    .collect();
                (eq, params)
            })
            .collect(),
    }
}

fn equation_names(estimation: &Estimation, family: &FamilyDef) -> Vec<String> {
    if estimation.equations.is_none() {
        return Vec::new();
    }
    match family.equations {
        EquationLayout::FromColumns => {
            let mut names: Vec<String> = Vec::new();
            for col in 0..estimation.columns.len() {
                if let Some(eq) = estimation.equation_of(col)
                    && !names.iter().any(|n| n == eq)
                {
                    names.push(eq.to_string());
                }
            }
            names
        }
        EquationLayout::Defined(defined) => defined
            .iter()
            .map(|name| resolve_equation(estimation, *name))
            .collect(),
        _ => Vec::new(),
    }
}

fn resolve_equation(estimation: &Estimation, name: EquationName) -> String {
    match name {
        EquationName::Literal(s) => s.to_string(),
        EquationName::DepVar => estimation.depvar.clone(),
    }
}

/// `equation` is the 1-based index and name of the equation the stats
/// belong to; `None` for model-wide stats.
fn resolve_stats(
    estimation: &Estimation,
    defs: &[StatDef],
    equation: Option<(usize, &str)>,
) -> Vec<ModelStat> {
    let (index, name) = equation.unwrap_or((1, estimation.depvar.as_str()));
    defs.iter()
        .map(|def| match def.source {
            StatSource::Scalar { key, p_key } => {
                ModelStat::new(def.label, estimation.scalar(key), def.scale)
                    .with_p(p_key.and_then(|k| estimation.scalar(k)))
            }
            StatSource::LastParameter => match estimation.columns.len().checked_sub(1) {
                Some(last) if !estimation.table.is_empty() => {
                    let last = estimation.parameter(last);
                    ModelStat::new(def.label, last.coef, def.scale)
                        .with_p(last.p)
                        .with_se(last.se)
                }
                _ => ModelStat::new(def.label, None, def.scale),
            },
            StatSource::PseudoR2 { abs_dev, raw_dev } => {
                let abs = estimation.scalar(&format!("{abs_dev}{index}"));
                let raw = estimation.scalar(&format!("{raw_dev}{index}"));
                ModelStat::new(def.label, pseudo_r2(abs, raw), def.scale)
            }
            StatSource::DeviationVectors => {
                ModelStat::new(def.label, estimation.deviation_r2(index - 1), def.scale)
            }
            StatSource::FirstStage { key, p_key } => {
                ModelStat::new(def.label, estimation.first_stage(name, key), def.scale)
                    .with_p(p_key.and_then(|k| estimation.first_stage(name, k)))
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/tests.rs"]
mod tests;
