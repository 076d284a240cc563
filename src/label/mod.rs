pub mod format;
pub mod metadata;

pub use metadata::{Metadata, NoMetadata, VariableCatalog};

use crate::decode::{LagDirection, Term, Variable};

pub const CONSTANT_LABEL: &str = "constant";

pub fn variable_label(v: &Variable, meta: &dyn Metadata) -> String {
    if v.is_constant() {
        return CONSTANT_LABEL.to_string();
    }

    let mut label = meta
        .display_label(&v.base_name)
        .unwrap_or(&v.base_name)
        .to_string();

    if let Some(level) = v.level {
        label.push_str(" = ");
        if meta.has_value_labels(&v.base_name) {
            match meta.value_label(&v.base_name, level) {
                Some(text) => label.push_str(text),
                None => label.push_str(&level.to_string()),
            }
        } else if let Some(fmt) = meta.display_format(&v.base_name) {
            label.push_str(&format::format_level(fmt, level));
        } else {
            label.push_str(&level.to_string());
        }
    }

    if let Some(lag) = v.lag {
        let sign = match lag.direction {
            LagDirection::Lag => '-',
            LagDirection::Lead => '+',
        };
        label.push_str(&format!(" (t {} {})", sign, lag.count));
    }

    if v.is_first_difference {
        label.push_str(" (delta)");
    }

    if v.is_base {
        label.insert_str(0, "base ");
    }
    label
}

/// Label for a whole term. Repeated factors of the same variable collapse into
/// power notation up to a cube; higher powers are spelled out.
pub fn term_label(t: &Term, meta: &dyn Metadata) -> String {
    let mut groups: Vec<(&str, Vec<&Variable>)> = Vec::new();
    for v in &t.variables {
        match groups.iter_mut().find(|(name, _)| *name == v.base_name) {
            Some((_, members)) => members.push(v),
            None => groups.push((v.base_name.as_str(), vec![v])),
        }
    }

    groups
        .iter()
        .map(|(_, members)| match members.len() {
            1 => variable_label(members[0], meta),
            2 => format!("{}²", variable_label(members[0], meta)),
            3 => format!("{}³", variable_label(members[0], meta)),
            _ => members
                .iter()
                .map(|v| variable_label(v, meta))
                .collect::<Vec<_>>()
                .join(" * "),
        })
        .collect::<Vec<_>>()
        .join(" * ")
}

#[cfg(test)]
#[path = "../../tests/src_inline/label/tests.rs"]
mod tests;
