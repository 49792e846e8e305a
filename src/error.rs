//! Error kinds for the balancer, per the fatal/non-fatal split the orchestrator relies on.

use thiserror::Error;

/// Top-level error kinds. `Configuration` and `CloudUnavailable` are fatal when they occur in a
/// phase that requires them; `Resource` and `MigrationDispatch` are always non-fatal and handled
/// by the caller as a single skipped move.
#[derive(Error, Debug)]
pub enum BalancerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cloud unavailable: {0}")]
    CloudUnavailable(String),

    #[error("resource invariant violation: {0}")]
    Resource(String),

    #[error("migration dispatch rejected: {0}")]
    MigrationDispatch(String),
}

impl From<reqwest::Error> for BalancerError {
    fn from(err: reqwest::Error) -> Self {
        BalancerError::CloudUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BalancerError>;
