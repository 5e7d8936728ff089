// pgdump-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid argument pattern '{name}': {reason}")]
    #[diagnostic(
        code(pgdump::domain::pattern),
        help("Check the regex syntax under detection.extra_patterns.")
    )]
    InvalidPattern { name: String, reason: String },

    #[error("Malformed metric: {0}")]
    #[diagnostic(code(pgdump::domain::metric))]
    MalformedMetric(String),
}
