use crate::report::format::{round_half_up, sig_stars};

/// A summary statistic rendered below the parameter block.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStat {
    pub label: String,
    pub value: Option<f64>,
    pub p: Option<f64>,
    pub se: Option<f64>,
    pub scale: u32,
}

impl ModelStat {
    pub fn new(label: impl Into<String>, value: Option<f64>, scale: u32) -> Self {
        Self {
            label: label.into(),
            value,
            p: None,
            se: None,
            scale,
        }
    }

    pub fn with_p(mut self, p: Option<f64>) -> Self {
        self.p = p;
        self
    }

    pub fn with_se(mut self, se: Option<f64>) -> Self {
        self.se = se;
        self
    }

    /// `None` when the engine reported the statistic as missing.
    pub fn render(&self) -> Option<String> {
        let value = self.value?;
        let mut out = round_half_up(value, self.scale);
        if let Some(p) = self.p {
            out.push_str(sig_stars(p));
        }
        if let Some(se) = self.se {
            out.push_str(&format!(" ({})", round_half_up(se, self.scale)));
        }
        Some(out)
    }
}
