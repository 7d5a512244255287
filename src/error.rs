//! Error Kinds
//!
//! Mirrors the Error Handling Design: query and proof paths never return
//! `Result` for a domain failure (see `QueryResult`/`ProveResult`), so this
//! module only covers ingest-time contract violations and persistence
//! failures. A [`crate::plugin::ComputePlugin`] reports its own failure to
//! evaluate through `ComputeOutcome::Unsupported`, never through this enum.

use thiserror::Error;

/// Errors raised while ingesting facts/rules or (de)serializing a KB snapshot.
///
/// These are the only panics-turned-`Result`s in the public API: everything
/// downstream of a successfully ingested KB (query, prove, ask) reports
/// failure through its own result type instead of this enum.
#[derive(Error, Debug)]
pub enum ContractViolation {
    /// A vector operation was handed mismatched lane counts.
    #[error("dimension mismatch: expected {expected} lanes, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A rule's conclusion referenced a variable absent from its condition.
    #[error("rule conclusion has unbound variable '{0}' with no matching condition binding")]
    UnboundHeadVariable(String),

    /// The AST handed to `encode`/`add_fact` was not fully ground where required.
    #[error("malformed AST: {0}")]
    MalformedAst(String),

    /// `query()` was asked to resolve more holes than the engine supports.
    #[error("too many holes in query: {found} exceeds the limit of {limit}")]
    TooManyHoles { found: usize, limit: usize },
}

/// Errors from (de)serializing an opaque KB snapshot blob.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot blob is truncated or not a sys2 snapshot")]
    BadMagic,

    #[error("snapshot format version {found} is not supported (expected {expected})")]
    VersionMismatch { expected: u16, found: u16 },

    #[error("snapshot strategy/dimension does not match the target session: {0}")]
    StrategyMismatch(String),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
}

/// Umbrella result type for the ingest/persistence boundary only.
pub type Sys2Result<T> = Result<T, Sys2Error>;

#[derive(Error, Debug)]
pub enum Sys2Error {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
