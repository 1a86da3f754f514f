use thiserror::Error;

/// Errors surfaced synchronously by the table engine.
///
/// Both variants are raised lazily: a column whose selector is never resolved,
/// or a style rule that is never reached, does not fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    /// A column selector is neither a path string nor an accessor function.
    #[error("invalid selector {selector}: expected a path string or an accessor function")]
    InvalidSelector {
        /// JSON rendering of the offending selector.
        selector: String,
    },
    /// A conditional style rule has a missing or unusable `when` predicate.
    #[error("invalid predicate in conditional style rule {rule}: {reason}")]
    InvalidPredicate {
        /// Zero-based position of the rule that was being evaluated.
        rule: usize,
        /// Human-readable description of what is wrong with the predicate.
        reason: String,
    },
}

impl TableError {
    pub fn invalid_predicate(rule: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPredicate {
            rule,
            reason: reason.into(),
        }
    }
}
