// crates/core/src/error.rs
use thiserror::Error;

/// Errors raised by the job registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An insert hit an id that is already tracked. Ids are random, so this
    /// signals a caller bug or an astronomically unlucky collision; the
    /// controller retries with a fresh id either way.
    #[error("duplicate download id: {id}")]
    DuplicateId { id: String },
}

/// Errors raised when handing a job to the worker pool.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The pool's work queue is closed; only happens once the pool has been
    /// shut down, never under load (a full queue waits instead of failing).
    #[error("worker pool is not accepting jobs")]
    PoolClosed,
}
