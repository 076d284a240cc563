use serde::Deserialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::decode::Term;
use crate::model::{ModelError, Parameter, present};

/// Coefficient vector `e(b)` with its variance matrix `e(V)`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoefVector {
    pub columns: Vec<String>,
    pub b: Vec<Option<f64>>,
    #[serde(rename = "V")]
    pub v: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    pub df_r: Option<f64>,
}

impl CoefVector {
    pub fn validate(&self) -> Result<(), ModelError> {
        let k = self.columns.len();
        check_len("b", self.b.len(), k)?;
        check_square("V", &self.v, k)
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        vector_parameters(&self.columns, &self.b, &self.v, self.df_r.and_then(present))
    }
}

/// Parameters from a coefficient vector and the diagonal of its variance
/// matrix. P-values come from Student's t with `df` degrees of freedom.
pub fn vector_parameters(
    columns: &[String],
    b: &[Option<f64>],
    v: &[Vec<Option<f64>>],
    df: Option<f64>,
) -> Vec<Parameter> {
    columns
        .iter()
        .enumerate()
        .map(|(col, token)| {
            let var = v.get(col).and_then(|row| entry(row, col));
            t_parameter(token, entry(b, col), var, df)
        })
        .collect()
}

/// One first-stage regression of an instrumental-variables model.
#[derive(Debug, Clone, Deserialize)]
pub struct Stage {
    /// The instrumented variable this stage explains.
    pub equation: String,
    #[serde(flatten)]
    pub coefs: CoefVector,
}

/// Parameters of quantile `q` from a term-by-quantile coefficient matrix and
/// the block-diagonal variance matrix over all quantiles. Terms that could not
/// be estimated (zero coefficient and zero variance) have no values.
pub fn quantile_parameters(
    columns: &[String],
    coefmat: &[Vec<Option<f64>>],
    v: &[Vec<Option<f64>>],
    q: usize,
    df: Option<f64>,
) -> Vec<Parameter> {
    let k = columns.len();
    columns
        .iter()
        .enumerate()
        .map(|(j, token)| {
            let coef = coefmat.get(j).and_then(|row| entry(row, q));
            let idx = j + k * q;
            let var = v.get(idx).and_then(|row| entry(row, idx));
            if coef == Some(0.0) && var == Some(0.0) {
                t_parameter(token, None, None, None)
            } else {
                t_parameter(token, coef, var, df)
            }
        })
        .collect()
}

fn t_parameter(token: &str, coef: Option<f64>, var: Option<f64>, df: Option<f64>) -> Parameter {
    let se = var.filter(|v| *v >= 0.0).map(f64::sqrt);
    let p = match (coef, se, df) {
        (Some(c), Some(s), Some(df)) => two_sided_p(c, s, df),
        _ => None,
    };
    Parameter {
        term: Term::parse(token),
        coef,
        se,
        p,
    }
}

/// Two-sided p-value of `coef / se` under Student's t with `df` degrees of
/// freedom. `None` for a zero standard error or invalid `df`.
pub fn two_sided_p(coef: f64, se: f64, df: f64) -> Option<f64> {
    if se <= 0.0 || !se.is_finite() {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(2.0 * (1.0 - dist.cdf((coef / se).abs())))
}

fn entry(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values.get(idx).copied().flatten().and_then(present)
}

pub(crate) fn check_len(name: &'static str, found: usize, expected: usize) -> Result<(), ModelError> {
    if found == expected {
        Ok(())
    } else {
        Err(ModelError::MatrixShape {
            name,
            found,
            expected,
        })
    }
}

pub(crate) fn check_square(
    name: &'static str,
    matrix: &[Vec<Option<f64>>],
    size: usize,
) -> Result<(), ModelError> {
    check_len(name, matrix.len(), size)?;
    matrix
        .iter()
        .try_for_each(|row| check_len(name, row.len(), size))
}
