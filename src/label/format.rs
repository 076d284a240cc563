const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Renders a categorical level with a Stata-style display format such as
/// `%9.0g`, `%8.2f`, `%td` or `%ty`. Unknown formats print the raw integer.
pub fn format_level(format: &str, level: i64) -> String {
    let spec = format.trim().trim_start_matches('%').trim_start_matches('-');
    if spec.starts_with("td") || spec.starts_with("d") {
        return format_daily(level).unwrap_or_else(|| level.to_string());
    }
    if spec.starts_with("ty") {
        return level.to_string();
    }

    let spec = spec.trim_end_matches('c');
    let Some(kind) = spec.chars().last() else {
        return level.to_string();
    };
    let decimals = spec
        .split_once('.')
        .and_then(|(_, rest)| rest.trim_end_matches(kind).parse::<usize>().ok());

    match (kind, decimals) {
        ('f', Some(d)) => format!("{:.*}", d, level as f64),
        ('e', Some(d)) => format_exponent(level as f64, d),
        ('g', _) => level.to_string(),
        _ => level.to_string(),
    }
}

fn format_exponent(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*e}", decimals, value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => raw,
    }
}

fn format_daily(days_since_1960: i64) -> Option<String> {
    // 1960-01-01 is day 3653 after the 1970 epoch
    let (year, month, day) = civil_from_days(days_since_1960.checked_sub(3653)?)?;
    Some(format!("{:02}{}{}", day, MONTHS[(month - 1) as usize], year))
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
/// `None` when the day count is too large to convert.
pub fn civil_from_days(days: i64) -> Option<(i64, u32, u32)> {
    let z = days.checked_add(719_468)?;
    let era = (if z >= 0 { z } else { z.checked_sub(146_096)? }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    Some((if m <= 2 { y + 1 } else { y }, m, d))
}
