//! Engine error types.

use thiserror::Error;

/// Fatal errors surfaced by the engine.
///
/// Candidate rejection (a user evaluation callback returning `false`) is
/// not an error; it is absorbed by the variation driver and surfaced only
/// through attempt counts. Everything here aborts the current solve and
/// leaves no partial history behind.
#[derive(Debug, Error)]
pub enum GaError {
    /// The configuration or the set of installed callbacks is inconsistent
    /// with the selected problem mode. Raised before any generation is
    /// produced.
    #[error("configuration error: {0}")]
    Config(String),

    /// A structural invariant was broken, which indicates a programmer
    /// error in the caller's callbacks (e.g. an empty reduced objective
    /// vector).
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// A chronometer was queried before being started.
    #[error("chronometer queried before it was started")]
    ChronometerNotStarted,
}
