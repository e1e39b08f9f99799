//! Numeric interpretation of extracted values.
//!
//! OCR output is text. Range checks need a number, category checks only
//! sometimes do, so parsing is an explicit step with a visible failure
//! branch instead of a silently swallowed error.

/// The result of interpreting one extracted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<'a> {
    /// The value parsed as a finite or infinite number.
    Numeric(f64),

    /// The value is not a number; carries the original text.
    Text(&'a str),
}

impl<'a> Reading<'a> {
    /// Interpret a raw extracted value.
    ///
    /// Surrounding whitespace is ignored. `NaN` is treated as text since it
    /// can never satisfy a comparison.
    pub fn parse(raw: &'a str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(value) if !value.is_nan() => Reading::Numeric(value),
            _ => Reading::Text(raw),
        }
    }

    /// The numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Reading::Numeric(value) => Some(*value),
            Reading::Text(_) => None,
        }
    }
}

/// Format a parsed measurement the way report readers expect a float:
/// whole numbers keep one decimal place (`200` becomes `200.0`).
pub fn format_measurement(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Format a reference bound as it is written in the profile:
/// whole numbers without decimals (`110`), fractions as-is (`1.5`).
pub fn format_bound(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
