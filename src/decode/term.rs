use crate::decode::{Variable, decode};

/// A single estimated coefficient: one variable or an interaction of several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub token: String,
    pub variables: Vec<Variable>,
}

impl Term {
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_string();
        let variables = token.split('#').map(decode).collect();
        Self { token, variables }
    }

    pub fn is_base(&self) -> bool {
        self.variables.iter().any(|v| v.is_base)
    }

    pub fn is_omitted(&self) -> bool {
        !self.is_base() && self.variables.iter().any(|v| v.is_omitted)
    }

    pub fn is_constant(&self) -> bool {
        self.variables.len() == 1 && self.variables[0].is_constant()
    }
}
