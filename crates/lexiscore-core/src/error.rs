//! Analysis error types.
//!
//! Only input validation and annotation failures reach the caller of
//! [`Analyzer::analyze`](crate::analyzer::Analyzer::analyze).
//! Everything that goes wrong inside scoring degrades to a heuristic default
//! and is logged instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of the word-count check on a submitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LengthStatus {
    TooShort,
    TooLong,
    Valid,
}

impl fmt::Display for LengthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthStatus::TooShort => write!(f, "TOO_SHORT"),
            LengthStatus::TooLong => write!(f, "TOO_LONG"),
            LengthStatus::Valid => write!(f, "VALID"),
        }
    }
}

/// Errors surfaced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The text has too few or too many words.
    #[error("text must contain between {min} and {max} words, got {word_count} ({status})")]
    TextLengthInvalid {
        word_count: usize,
        status: LengthStatus,
        min: usize,
        max: usize,
    },

    /// The annotation collaborator failed. There is no fallback for this.
    #[error("annotation unavailable: {0}")]
    AnnotationUnavailable(String),
}

impl AnalysisError {
    /// Returns the length status for validation errors.
    pub fn length_status(&self) -> Option<LengthStatus> {
        match self {
            AnalysisError::TextLengthInvalid { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_error_message_carries_status_and_count() {
        let err = AnalysisError::TextLengthInvalid {
            word_count: 89,
            status: LengthStatus::TooShort,
            min: 90,
            max: 400,
        };
        let msg = err.to_string();
        assert!(msg.contains("89"));
        assert!(msg.contains("TOO_SHORT"));
        assert_eq!(err.length_status(), Some(LengthStatus::TooShort));
    }

    #[test]
    fn length_status_serializes_screaming_case() {
        let json = serde_json::to_string(&LengthStatus::TooLong).unwrap();
        assert_eq!(json, "\"TOO_LONG\"");
    }
}
