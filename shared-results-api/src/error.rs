use itertools::Itertools;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedResultError {
    /// An edge mutation referenced aliases that no earlier top-level mutation produced
    #[error("No shared result registered under alias(es): {}", quoted(.aliases))]
    MissingSharedResult { aliases: Vec<String> },
    #[error("Shared result '{alias}' is not a {expected}")]
    SharedResultTypeMismatch {
        alias: String,
        expected: &'static str,
    },
    #[error("'{0}' is not a valid result reference, expected a GraphQL alias")]
    InvalidResultRef(String),
}

impl SharedResultError {
    pub fn missing(alias: impl Into<String>) -> Self {
        Self::MissingSharedResult {
            aliases: vec![alias.into()],
        }
    }

    /// Machine readable error code, stable across message changes
    pub fn code(&self) -> &'static str {
        match self {
            SharedResultError::MissingSharedResult { .. } => "MISSING_SHARED_RESULT",
            SharedResultError::SharedResultTypeMismatch { .. } => "SHARED_RESULT_TYPE_MISMATCH",
            SharedResultError::InvalidResultRef(_) => "INVALID_RESULT_REF",
        }
    }
}

fn quoted(aliases: &[String]) -> String {
    aliases.iter().map(|alias| format!("\"{alias}\"")).join(", ")
}
