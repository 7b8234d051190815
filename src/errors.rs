use thiserror::Error;

/// Failures of a single archive request. Every variant is terminal for the request
/// and its text ends up in the response body, so messages name the bucket, table or
/// key involved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    ConfigMissing(String),

    #[error("{0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AssemblyFailure(String),

    #[error("{0}")]
    InvalidRecord(String),
}

pub use Error::*;

pub type Result<T, E = Error> = std::result::Result<T, E>;
