//! Core types for measurement validation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reading::{format_bound, format_measurement};

/// What a reference profile expects for one measurement label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedValue {
    /// Inclusive numeric bounds, written as `range: [min, max]`.
    Range(f64, f64),

    /// Exact, case-sensitive string match.
    Category(String),
}

impl ExpectedValue {
    /// Create a range expectation.
    pub fn range(min: f64, max: f64) -> Self {
        Self::Range(min, max)
    }

    /// Create a category expectation.
    pub fn category(expected: impl Into<String>) -> Self {
        Self::Category(expected.into())
    }

    /// Human-readable form used in listings.
    pub fn describe(&self) -> String {
        match self {
            ExpectedValue::Range(min, max) => {
                format!("{} - {}", format_bound(*min), format_bound(*max))
            }
            ExpectedValue::Category(expected) => expected.clone(),
        }
    }
}

/// Structured classification of a discrepancy.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// The profile expects a label the extracted data does not contain.
    MissingLabel,

    /// A numeric value lies outside the inclusive range.
    RangeMismatch { value: f64, min: f64, max: f64 },

    /// A value expected to be numeric could not be parsed.
    UnparsableNumeric { raw: String, min: f64, max: f64 },

    /// A value differs from the expected category.
    CategoryMismatch { actual: String, expected: String },
}

/// One discrepancy between extracted data and a reference profile.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Issue {
    /// The measurement label this issue is about
    pub label: String,

    /// What went wrong
    #[serde(flatten)]
    pub kind: IssueKind,

    /// Human-readable description
    pub message: String,
}

impl Issue {
    /// An expected label is absent.
    pub fn missing(label: impl Into<String>) -> Self {
        let label = label.into();
        let message = format!("{} is missing from the extracted data.", label);
        Self {
            label,
            kind: IssueKind::MissingLabel,
            message,
        }
    }

    /// A parsed value is out of range.
    pub fn out_of_range(label: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        let label = label.into();
        let message = format!(
            "{}: {} is out of range ({}, {})",
            label,
            format_measurement(value),
            format_bound(min),
            format_bound(max)
        );
        Self {
            label,
            kind: IssueKind::RangeMismatch { value, min, max },
            message,
        }
    }

    /// A value that should be numeric is not.
    pub fn unparsable(label: impl Into<String>, raw: impl Into<String>, min: f64, max: f64) -> Self {
        let label = label.into();
        let raw = raw.into();
        let message = format!(
            "{}: {} is not a number, expected range ({}, {})",
            label,
            raw,
            format_bound(min),
            format_bound(max)
        );
        Self {
            label,
            kind: IssueKind::UnparsableNumeric { raw, min, max },
            message,
        }
    }

    /// A value does not match the expected category.
    pub fn category_mismatch(
        label: impl Into<String>,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        let label = label.into();
        let actual = actual.into();
        let expected = expected.into();
        let message = format!("{}: {} is not {}", label, actual, expected);
        Self {
            label,
            kind: IssueKind::CategoryMismatch { actual, expected },
            message,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The result of validating extracted data against one profile.
///
/// `healthy` is derived from `issues` at construction and cannot drift.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationVerdict {
    profile: String,
    healthy: bool,
    issues: Vec<Issue>,
}

impl ValidationVerdict {
    /// Build a verdict from the issues found for `profile`.
    pub fn new(profile: impl Into<String>, issues: Vec<Issue>) -> Self {
        Self {
            profile: profile.into(),
            healthy: issues.is_empty(),
            issues,
        }
    }

    /// Name of the profile that was applied.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// True iff no issues were found.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Issues in profile order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issue messages in profile order.
    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }
}

/// Outcome of a validation call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// A profile was selected and every expected label was evaluated.
    Assessed { verdict: ValidationVerdict },

    /// No profile could be selected; nothing was evaluated.
    UnknownProfile {
        /// The selector value found in the data, if there was one
        selector: Option<String>,
    },
}

impl Outcome {
    /// The verdict, if validation ran.
    pub fn verdict(&self) -> Option<&ValidationVerdict> {
        match self {
            Outcome::Assessed { verdict } => Some(verdict),
            Outcome::UnknownProfile { .. } => None,
        }
    }

    /// True iff validation ran and found no issues.
    pub fn is_healthy(&self) -> bool {
        self.verdict().map(|v| v.is_healthy()).unwrap_or(false)
    }

    /// True iff no profile could be selected.
    pub fn is_unknown_profile(&self) -> bool {
        matches!(self, Outcome::UnknownProfile { .. })
    }
}
