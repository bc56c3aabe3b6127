//! Input cleanup for settings values.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static SCRIPT_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(?:script|style)[^>]*?>.*?</(?:script|style)>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n\t ]+").unwrap());
static OCTET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").unwrap());

/// Clean a single-line text value: drop markup, collapse whitespace, trim,
/// and remove percent-encoded octets.
pub fn sanitize_text_field(input: &str) -> String {
    let without_scripts = SCRIPT_STYLE.replace_all(input, "");
    let without_tags = TAG.replace_all(&without_scripts, "");
    let mut out = WHITESPACE.replace_all(&without_tags, " ").trim().to_string();

    // Removing one octet can join two halves into a new one, so repeat.
    while OCTET.is_match(&out) {
        out = OCTET.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Non-negative integer from a loosely typed value.
///
/// Numbers are truncated and made absolute; strings use their leading
/// integer (`"12abc"` is 12); anything else is 0.
pub fn absint(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(i) = n.as_i64() {
                i.unsigned_abs()
            } else {
                n.as_f64().map(|f| f.trunc().abs() as u64).unwrap_or(0)
            }
        }
        Value::String(s) => leading_int(s.trim()).unsigned_abs(),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

fn leading_int(s: &str) -> i64 {
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let n: i64 = digits[..end].parse().unwrap_or(0);
    if negative { -n } else { n }
}
