//! Shared text patterns for recognizing measurements in OCR output.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of whitespace, including the line breaks OCR inserts.
    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Value shape for numeric measurements: `150`, `42.5`, `12,5`.
pub const NUMERIC_VALUE: &str = r"(?P<value>[-+]?\d+(?:[.,]\d+)?)";

/// Value shape for categorical measurements: a single word.
pub const WORD_VALUE: &str = r"(?P<value>[A-Za-z]+)";

/// Optional unit in parentheses and separator between label and value.
const LABEL_SUFFIX: &str = r"(?:\s*\([^)]*\))?\s*[:=\-]?\s*";

/// Write a matched numeric value with a decimal point: `12,5` becomes `12.5`.
pub fn decimal_point(value: &str) -> String {
    value.replace(',', ".")
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Regex source matching a label (case-insensitive, any whitespace between
/// its words) followed by a value of the given shape.
pub fn label_pattern(label: &str, value: &str) -> String {
    let words: Vec<String> = label.split_whitespace().map(regex::escape).collect();
    format!(r"(?i)\b{}\b{}{}", words.join(r"\s+"), LABEL_SUFFIX, value)
}

/// Regex source matching a phrase case-insensitively, tolerant of spacing.
pub fn phrase_pattern(phrase: &str) -> String {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    format!(r"(?i){}", words.join(r"\s*"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_point() {
        assert_eq!(decimal_point("12,5"), "12.5");
        assert_eq!(decimal_point("150"), "150");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  FETAL\nHEART   BEAT "), "FETAL HEART BEAT");
    }

    #[test]
    fn test_label_pattern_numeric() {
        let re = Regex::new(&label_pattern("FETAL HEART BEAT", NUMERIC_VALUE)).unwrap();
        for text in [
            "Fetal heart beat: 150",
            "FETAL  HEART BEAT (bpm) 150",
            "fetal heart beat - 150 bpm",
        ] {
            let caps = re.captures(text).unwrap();
            assert_eq!(&caps["value"], "150", "{}", text);
        }
    }

    #[test]
    fn test_label_pattern_word() {
        let re = Regex::new(&label_pattern("CARDIAC ACTIVITY", WORD_VALUE)).unwrap();
        let caps = re.captures("Cardiac activity : present").unwrap();
        assert_eq!(&caps["value"], "present");
    }

    #[test]
    fn test_phrase_pattern_tolerates_spacing() {
        let re = Regex::new(&phrase_pattern("2/3 Trimester Scan Report")).unwrap();
        assert!(re.is_match("2/3 TRIMESTER SCANREPORT"));
        assert!(!re.is_match("First Trimester Scan Report"));
    }
}
