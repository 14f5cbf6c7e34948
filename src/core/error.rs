//! Error handling logic

use thiserror::Error;

use crate::validation::Violation;

/// Errors raised while checking, compiling or simulating a pattern.
///
/// The variants follow the failure classes of the measurement calculus
/// tooling. Only [`MbqcError::IllFormed`] describes bad user input; the others
/// point at a defect in a template, in the engine, or in the calling code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MbqcError {
    /// The pattern breaks one or more of the D0–D4 well-formedness conditions.
    /// Every violation found in the checking pass is carried.
    #[error("pattern is not well-formed: {}", summarize(.0))]
    IllFormed(Vec<Violation>),

    /// A gate template could not be lowered into elementary commands.
    /// This is a defect in the template definition, never a recoverable input error.
    #[error("template '{template}' failed to compile: {message}")]
    TemplateCompilation {
        /// Name of the offending template.
        template: String,
        /// What went wrong, including the directive index where known.
        message: String,
    },

    /// Probability mass drifted away from 1 beyond the configured tolerance.
    #[error("numeric consistency lost during {context}: total probability {total} deviates from 1 by more than {tolerance:e}")]
    NumericConsistency {
        /// Where the deviation was detected (command index, branch, final distribution).
        context: String,
        /// The observed total probability or squared norm.
        total: f64,
        /// The tolerance that was exceeded.
        tolerance: f64,
    },

    /// The engine was asked to run something it must never run, e.g. a
    /// rejected pattern or one larger than the configured qubit limit.
    #[error("precondition violated: {message}")]
    Precondition {
        /// Description of the violated precondition.
        message: String,
        /// Every well-formedness violation when the pattern was rejected by
        /// the checker; empty for other preconditions.
        violations: Vec<Violation>,
    },

    /// An engine invariant that checking should have established does not hold.
    #[error("internal engine error: {message}")]
    Internal {
        /// What broke, including the command index where known.
        message: String,
    },
}

impl MbqcError {
    /// A precondition failure that is not about well-formedness.
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        MbqcError::Precondition { message: message.into(), violations: Vec::new() }
    }

    /// The violations carried by `IllFormed` or a rejected-pattern
    /// `Precondition`; empty for every other error.
    pub fn violations(&self) -> &[Violation] {
        match self {
            MbqcError::IllFormed(violations) | MbqcError::Precondition { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Result type for pattern operations.
pub type Result<T> = std::result::Result<T, MbqcError>;

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no violations recorded".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}
