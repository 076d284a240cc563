pub mod term;

pub use term::Term;

pub const CONSTANT_NAME: &str = "_cons";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagDirection {
    Lag,
    Lead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagSpec {
    pub direction: LagDirection,
    pub count: u32,
}

/// One component of a parameter token, e.g. `2b.region` or `l2.gdp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub base_name: String,
    pub level: Option<i64>,
    pub is_omitted: bool,
    pub is_base: bool,
    pub lag: Option<LagSpec>,
    pub is_first_difference: bool,
}

impl Variable {
    pub fn plain(name: &str) -> Self {
        Self {
            base_name: name.to_lowercase(),
            level: None,
            is_omitted: false,
            is_base: false,
            lag: None,
            is_first_difference: false,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.base_name == CONSTANT_NAME
    }
}

#[derive(Debug, Default)]
struct Flags {
    level: Option<i64>,
    omitted: bool,
    base: bool,
    lag: Option<LagSpec>,
    first_difference: bool,
}

/// Decodes a single `#`-free token. Never fails: anything outside the flag
/// grammar becomes a plain variable named after the whole token.
pub fn decode(token: &str) -> Variable {
    let lower = token.to_lowercase();
    let Some((prefix, name)) = lower.split_once('.') else {
        return Variable::plain(&lower);
    };
    if name.is_empty() {
        return Variable::plain(&lower);
    }
    match scan_flags(prefix) {
        Some(flags) => Variable {
            base_name: name.to_string(),
            level: flags.level,
            is_omitted: flags.omitted,
            is_base: flags.base,
            lag: flags.lag,
            is_first_difference: flags.first_difference,
        },
        None => Variable::plain(&lower),
    }
}

fn scan_flags(prefix: &str) -> Option<Flags> {
    let bytes = prefix.as_bytes();
    let mut flags = Flags::default();
    let mut i = 0usize;

    // level digits are only recognized at the start of the run
    let level_end = take_digits(bytes, 0);
    if level_end > 0 {
        flags.level = Some(prefix[..level_end].parse().ok()?);
        i = level_end;
    }

    while i < bytes.len() {
        match bytes[i] {
            b'c' => i += 1,
            b'o' => {
                flags.omitted = true;
                i += 1;
            }
            b'b' => {
                if bytes.get(i + 1) == Some(&b'n') {
                    i += 2;
                } else {
                    flags.base = true;
                    i += 1;
                }
            }
            b'd' => {
                flags.first_difference = true;
                i += 1;
            }
            letter @ (b'l' | b'f') => {
                if flags.lag.is_some() {
                    return None;
                }
                let end = take_digits(bytes, i + 1);
                let count = if end > i + 1 {
                    prefix[i + 1..end].parse::<u32>().ok()?
                } else {
                    1
                };
                if count == 0 {
                    return None;
                }
                let direction = if letter == b'l' {
                    LagDirection::Lag
                } else {
                    LagDirection::Lead
                };
                flags.lag = Some(LagSpec { direction, count });
                i = end;
            }
            _ => return None,
        }
    }
    Some(flags)
}

fn take_digits(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    end
}

#[cfg(test)]
#[path = "../../tests/src_inline/decode/tests.rs"]
mod tests;
