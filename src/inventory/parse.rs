//! Tolerant readers for usage fields that were historically typed as free text.
//!
//! None of these functions fail: malformed input counts as "no usage".

use serde::{Deserialize, Serialize};

const YES_WORDS: [&str; 6] = ["si", "sí", "yes", "true", "ok", "x"];

/// Strips every non-digit character and parses what is left; `0` when nothing parses.
pub fn parse_lenient_int(raw: &str) -> i64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

pub fn parse_lenient_opt(raw: Option<&str>) -> i64 {
    raw.map(parse_lenient_int).unwrap_or(0)
}

fn is_yes(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    YES_WORDS.contains(&lowered.as_str())
}

/// Reads a "was this used" field: at most one unit per report.
pub fn parse_flag(raw: Option<&str>) -> i64 {
    match raw.map(str::trim) {
        None | Some("") => 0,
        Some(text) if is_yes(text) => 1,
        Some(text) => i64::from(parse_lenient_int(text) > 0),
    }
}

/// Seal and modem fields hold a serial when the item was used.
pub fn count_serial_like(raw: Option<&str>) -> i64 {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => 1,
        _ => 0,
    }
}

/// Counts units in a field that may hold a number, a yes-word, a serial, or a list of serials.
pub fn count_quantity(raw: Option<&str>) -> i64 {
    let text = match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return 0,
    };

    if is_yes(text) {
        return 1;
    }

    if text.contains(',') {
        return text.split(',').filter(|part| !part.trim().is_empty()).count() as i64;
    }

    if looks_like_serial(text) {
        return 1;
    }

    let numeric = parse_lenient_int(text);
    if numeric > 1000 {
        return 1;
    }
    numeric
}

/// A lone serial such as "J2M9C4": letters and digits, no spaces, longer than 3.
fn looks_like_serial(text: &str) -> bool {
    text.chars().count() > 3
        && !text.chars().any(char::is_whitespace)
        && text.chars().any(char::is_alphabetic)
        && text.chars().any(|c| c.is_ascii_digit())
}

/// Request field that accepts a string, number, or boolean and keeps it as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawText")]
pub struct LenientText(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<RawText> for LenientText {
    fn from(raw: RawText) -> Self {
        LenientText(match raw {
            RawText::Text(s) => s,
            RawText::Int(n) => n.to_string(),
            RawText::Float(f) => f.to_string(),
            RawText::Bool(true) => "Si".to_string(),
            RawText::Bool(false) => String::new(),
        })
    }
}

impl LenientText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer view of the field, `None` when blank.
    pub fn to_int(&self) -> Option<i64> {
        let trimmed = self.0.trim();
        (!trimmed.is_empty()).then(|| parse_lenient_int(trimmed))
    }

    pub fn to_float(&self) -> Option<f64> {
        self.0.trim().replace(',', ".").parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_int_strips_units_and_defaults_to_zero() {
        assert_eq!(parse_lenient_int("120m"), 120);
        assert_eq!(parse_lenient_int(" 1 000 metros"), 1000);
        assert_eq!(parse_lenient_int("n/a"), 0);
        assert_eq!(parse_lenient_int(""), 0);
        assert_eq!(parse_lenient_opt(None), 0);
    }

    #[test]
    fn flags_never_exceed_one() {
        assert_eq!(parse_flag(Some("Si")), 1);
        assert_eq!(parse_flag(Some("true")), 1);
        assert_eq!(parse_flag(Some("3")), 1);
        assert_eq!(parse_flag(Some("No")), 0);
        assert_eq!(parse_flag(Some("0")), 0);
        assert_eq!(parse_flag(None), 0);
    }

    #[test]
    fn serial_like_fields_count_presence() {
        assert_eq!(count_serial_like(Some("P-88231")), 1);
        assert_eq!(count_serial_like(Some("   ")), 0);
        assert_eq!(count_serial_like(None), 0);
    }

    #[test]
    fn quantity_counting_heuristics() {
        assert_eq!(count_quantity(Some("2 unds")), 2);
        assert_eq!(count_quantity(Some("si")), 1);
        assert_eq!(count_quantity(Some("ZTE1, ZTE2, ,ZTE3")), 3);
        assert_eq!(count_quantity(Some("J2M9C4")), 1);
        assert_eq!(count_quantity(Some("48213")), 1);
        assert_eq!(count_quantity(Some("abc")), 0);
        assert_eq!(count_quantity(None), 0);
    }

    #[test]
    fn lenient_text_accepts_any_scalar() {
        let parsed: Vec<LenientText> = serde_json::from_str(r#"["12m", 7, 2.5, true, false]"#).unwrap();
        assert_eq!(parsed[0].to_int(), Some(12));
        assert_eq!(parsed[1].as_str(), "7");
        assert_eq!(parsed[2].to_float(), Some(2.5));
        assert_eq!(parsed[3].as_str(), "Si");
        assert_eq!(parsed[4].to_int(), None);
    }
}
