// Utility helpers for reading loosely-typed JSON values and formatting numbers.
//
// The API hands back every field as either a string or a number, and not
// always the same one from record to record. Everything that has to look at a
// raw `serde_json::Value` goes through here so the rest of the code deals in
// `f64`, `i64` and `String`.
use num_format::{Locale, ToFormattedString};
use serde_json::{Number, Value};

/// Render a JSON number the way a browser would print it: integral floats
/// lose their trailing `.0`.
pub fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Text of a value if it counts as "present".
///
/// Missing fields, `null`, empty strings, `false`, `0` and NaN are all treated
/// as absent so callers can fall back to a default.
pub fn truthy_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 || f.is_nan() => None,
            _ => Some(number_text(n)),
        },
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Length of the longest prefix of `s` that reads as a decimal float
/// (`[+-]digits[.digits][e[+-]digits]`). Zero when there is no digit.
fn float_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Parse the leading numeric part of a string, ignoring whatever follows.
///
/// `"1500"` and `"1500 days"` both give `1500.0`; `"1,500"` stops at the comma
/// and gives `1.0`; `"n/a"` gives `None`.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let len = float_prefix_len(s);
    if len == 0 {
        return None;
    }
    s[..len].parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Lenient float read of a record field; anything unreadable is `None`.
pub fn value_as_f64(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Series value for a record field: the lenient float, or `0.0`.
pub fn value_or_zero(v: Option<&Value>) -> f64 {
    value_as_f64(v).unwrap_or(0.0)
}

/// Integer-truncated read of a record field, `0` when absent or unreadable.
pub fn value_as_int(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::String(s)) => {
            let s = s.trim_start();
            let b = s.as_bytes();
            let mut end = 0;
            if end < b.len() && (b[end] == b'+' || b[end] == b'-') {
                end += 1;
            }
            let digits_start = end;
            while end < b.len() && b[end].is_ascii_digit() {
                end += 1;
            }
            if end == digits_start {
                return 0;
            }
            s[..end].parse::<i64>().unwrap_or(0)
        }
        other => value_as_f64(other).map(|f| f.trunc() as i64).unwrap_or(0),
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus grouped thousands (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Grouped-digit rendering of a chart value: integers print without a
/// fractional part, anything else keeps up to two decimals.
pub fn format_value(n: f64) -> String {
    if n.fract() == 0.0 {
        format_number(n, 0)
    } else {
        let s = format_number(n, 2);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Drop the query string from a URL before it goes anywhere near a log line;
/// the records endpoint carries an API key there.
pub fn redact_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn float_prefix_follows_lenient_rules() {
        assert_eq!(parse_float_prefix("1500"), Some(1500.0));
        assert_eq!(parse_float_prefix("  42.5abc"), Some(42.5));
        assert_eq!(parse_float_prefix("1,500"), Some(1.0));
        assert_eq!(parse_float_prefix("-3e2x"), Some(-300.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("7e"), Some(7.0));
        assert_eq!(parse_float_prefix("n/a"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn missing_or_garbage_values_read_as_zero() {
        assert_eq!(value_or_zero(None), 0.0);
        assert_eq!(value_or_zero(Some(&Value::Null)), 0.0);
        assert_eq!(value_or_zero(Some(&json!("NA"))), 0.0);
        assert_eq!(value_or_zero(Some(&json!(12.25))), 12.25);
        assert_eq!(value_or_zero(Some(&json!("300"))), 300.0);
    }

    #[test]
    fn int_reads_truncate() {
        assert_eq!(value_as_int(Some(&json!("5.9"))), 5);
        assert_eq!(value_as_int(Some(&json!(5.9))), 5);
        assert_eq!(value_as_int(Some(&json!("-12 days"))), -12);
        assert_eq!(value_as_int(Some(&json!("none"))), 0);
        assert_eq!(value_as_int(None), 0);
    }

    #[test]
    fn truthy_text_treats_blank_as_absent() {
        assert_eq!(truthy_text(Some(&json!("2022-23"))), Some("2022-23".into()));
        assert_eq!(truthy_text(Some(&json!(""))), None);
        assert_eq!(truthy_text(Some(&json!(0))), None);
        assert_eq!(truthy_text(Some(&json!(2021))), Some("2021".into()));
        assert_eq!(truthy_text(Some(&json!(2021.0))), Some("2021".into()));
        assert_eq!(truthy_text(None), None);
    }

    #[test]
    fn grouped_formatting() {
        assert_eq!(format_int(1500i64), "1,500");
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_value(1500.0), "1,500");
        assert_eq!(format_value(12.5), "12.5");
        assert_eq!(format_value(-2500.25), "-2,500.25");
    }

    #[test]
    fn redaction_strips_query() {
        assert_eq!(
            redact_url("https://api.example/resource?api-key=secret"),
            "https://api.example/resource"
        );
    }
}
