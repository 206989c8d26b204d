//! Error kinds for a single sampling cycle.
//!
//! Every failure here is scoped to one pool's cycle: the scheduler logs it
//! and moves on to the next pool. Nothing in this module aborts the
//! process.

use thiserror::Error;

/// The history store could not write a pool's file.
///
/// Read-side failures never surface as this type; an unreadable or
/// malformed file is treated as an empty history instead.
#[derive(Error, Debug)]
#[error("history persistence failed: {0}")]
pub struct PersistenceError(pub String);

/// Reasons a sampling cycle aborts without writing a snapshot.
#[derive(Error, Debug)]
pub enum CycleError {
    /// The price oracle request failed, or a required asset id was
    /// missing from its response.
    #[error("price fetch failed: {0}")]
    PriceFetch(String),

    /// The RPC endpoint or the pair contract did not answer.
    #[error("chain query failed: {0}")]
    ChainQuery(String),

    /// The pool has no outstanding shares; a user position cannot be
    /// imputed from it.
    #[error("pool share supply is zero")]
    DivisionByZero,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
