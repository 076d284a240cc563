pub fn sig_stars(p: f64) -> &'static str {
    if p < 0.01 {
        "***"
    } else if p < 0.05 {
        "**"
    } else if p < 0.1 {
        "*"
    } else {
        ""
    }
}

/// Fixed-point rendering with half-up rounding on the decimal digits.
pub fn round_half_up(value: f64, scale: u32) -> String {
    let factor = 10f64.powi(scale as i32);
    let scaled = value * factor;
    // nudge values that sit a hair below .5 because of binary representation
    let rounded = (scaled + scaled.signum() * 1e-9).round() / factor;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", scale as usize, rounded)
}

pub fn format_optional(value: Option<f64>, scale: u32) -> String {
    value.map(|v| round_half_up(v, scale)).unwrap_or_default()
}

pub fn format_timestamp(secs_since_epoch: u64) -> String {
    let days = (secs_since_epoch / 86_400) as i64;
    let rem = secs_since_epoch % 86_400;
    let Some((y, m, d)) = crate::label::format::civil_from_days(days) else {
        return secs_since_epoch.to_string();
    };
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        y,
        m,
        d,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/format.rs"]
mod tests;
