//! Value formatting and line layout
//!
//! Widths are estimated, not measured: every character counts as
//! `font_size * 0.6` points when deciding where lines break.

use chrono::{DateTime, Datelike, NaiveDate};
use serde_json::Value;

pub const CHAR_WIDTH_FACTOR: f32 = 0.6;
pub const ELLIPSIS: &str = "...";

/// Characters that fit on one line of `max_width` points, at least one
pub fn line_capacity(max_width: f32, font_size: f32) -> usize {
    let per_char = font_size * CHAR_WIDTH_FACTOR;
    if per_char <= 0.0 {
        return 1;
    }
    ((max_width / per_char).floor() as usize).max(1)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Greedy word wrap; words longer than a line are hard-broken
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let capacity = line_capacity(max_width, font_size);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > capacity {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(capacity);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();

        if current.is_empty() {
            current = word;
        } else if char_len(&current) + 1 + char_len(&word) <= capacity {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap and cap at `max_lines`; overflow shortens the last kept line so
/// that it plus an ellipsis still fits
pub fn fit_lines(text: &str, max_width: f32, font_size: f32, max_lines: usize) -> Vec<String> {
    let max_lines = max_lines.max(1);
    let mut lines = wrap_text(text, max_width, font_size);
    if lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    let capacity = line_capacity(max_width, font_size);
    if let Some(last) = lines.last_mut() {
        // Cells narrower than the ellipsis get as many dots as fit
        if capacity <= ELLIPSIS.len() {
            *last = ELLIPSIS[..capacity].to_string();
            return lines;
        }
        let mut shortened: String = last.chars().take(capacity - ELLIPSIS.len()).collect();
        shortened.truncate(shortened.trim_end().len());
        shortened.push_str(ELLIPSIS);
        *last = shortened;
    }
    lines
}

/// Integer part grouped by thousands
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_number(n: f64) -> String {
    let sign = if n < 0.0 { "-" } else { "" };
    let n = n.abs();
    let whole = n.trunc();
    let frac = ((n - whole) * 1000.0).round() as u64;
    // Rounding may carry into the integer part
    let (whole, frac) = if frac >= 1000 {
        (whole as u64 + 1, 0)
    } else {
        (whole as u64, frac)
    };
    let mut out = format!("{}{}", sign, group_thousands(whole));
    if frac > 0 {
        let frac = format!("{:03}", frac);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Apply a text field's `format`; only `#,###` number grouping is known
pub fn format_value(value: &str, format: Option<&str>) -> String {
    let Some(format) = format else {
        return value.to_string();
    };
    if format.contains("#,###") {
        if let Ok(n) = value.trim().replace(',', "").parse::<f64>() {
            if n.is_finite() {
                return format.replacen("#,###", &format_number(n), 1);
            }
        }
    }
    value.to_string()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y년 %m월 %d일"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
}

/// Substitute `YYYY`, `MM`, `M`, `DD`, `D` in `format` from `value`.
///
/// Without a format, or when `value` is not a date, the value is returned
/// as given.
pub fn format_date(value: &str, format: Option<&str>) -> String {
    let (Some(format), Some(date)) = (format, parse_date(value)) else {
        return value.to_string();
    };

    let mut out = String::new();
    let mut rest = format;
    while !rest.is_empty() {
        let (token, len) = if rest.starts_with("YYYY") {
            (date.year().to_string(), 4)
        } else if rest.starts_with("MM") {
            (format!("{:02}", date.month()), 2)
        } else if rest.starts_with('M') {
            (date.month().to_string(), 1)
        } else if rest.starts_with("DD") {
            (format!("{:02}", date.day()), 2)
        } else if rest.starts_with('D') {
            (date.day().to_string(), 1)
        } else {
            let c = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            out.push_str(&rest[..c]);
            rest = &rest[c..];
            continue;
        };
        out.push_str(&token);
        rest = &rest[len..];
    }
    out
}

/// Follow a dotted path through nested JSON objects
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |current, key| current.get(key))
        .filter(|v| !v.is_null())
}

/// Printable form of a scalar; empty strings, objects and arrays have none
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fit_lines_never_exceeds_limits(
            text in "[A-Za-z가-힣0-9 ]{0,120}",
            width in 20.0f32..400.0,
            size in 6.0f32..16.0,
            max_lines in 1usize..4,
        ) {
            let capacity = line_capacity(width, size);
            let lines = fit_lines(&text, width, size, max_lines);
            prop_assert!(lines.len() <= max_lines);
            for line in &lines {
                prop_assert!(
                    line.chars().count() <= capacity,
                    "line {:?} over capacity {}", line, capacity
                );
            }
        }
    }
}
