//! Error types for batching and for the inference pipeline built on top of it.

use thiserror::Error;

/// Errors raised by the batching core.
///
/// Empty input is not an error: it produces an empty plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// A sizing parameter that must be positive was zero.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors surfaced by [`SortedBatchInference`](crate::pipeline::SortedBatchInference).
///
/// Collaborator failures are carried as the collaborator's own error value, untouched,
/// so callers can match on them exactly as they would without the pipeline in between.
///
/// # Type Parameters
///
/// * `T` - The tokenizer's error type
/// * `I` - The inference collaborator's error type
#[derive(Debug, Error)]
pub enum PipelineError<T, I> {
    /// The batching configuration was rejected before any work started.
    #[error(transparent)]
    Batching(#[from] BatchError),

    /// The tokenizer collaborator failed.
    #[error("tokenizer failed: {0}")]
    Tokenizer(T),

    /// The inference collaborator failed while processing a batch.
    #[error("inference failed: {0}")]
    Inference(I),

    /// A collaborator broke its one-result-per-input contract.
    #[error("{stage} returned {actual} results for {expected} inputs")]
    CountMismatch {
        /// Which collaborator produced the mismatch
        stage: &'static str,
        /// Number of inputs handed to the collaborator
        expected: usize,
        /// Number of results it returned
        actual: usize,
    },
}
