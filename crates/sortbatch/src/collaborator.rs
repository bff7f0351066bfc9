use std::fmt::{Debug, Display};
use async_trait::async_trait;
use crate::batch::Batch;
use crate::config::{GenerationConfig, TokenizeConfig};

/// # Tokenizer
///
/// Maps prompts to token id sequences.
///
/// Tokenization rules are entirely the implementor's business; the pipeline only relies
/// on the contract below.
///
/// ## Contract
///
/// * Exactly one id sequence per prompt, in prompt order
/// * At most `config.truncate_to` ids per sequence
/// * Sequences may be empty (e.g. for an empty prompt); the pipeline drops those
///
/// # Example
///
/// ```rust
/// use sortbatch::collaborator::Tokenizer;
/// use sortbatch::config::TokenizeConfig;
///
/// /// One token per byte.
/// struct ByteTokenizer;
///
/// impl Tokenizer for ByteTokenizer {
///     type Error = std::convert::Infallible;
///
///     fn tokenize(&self, prompts: &[String], config: &TokenizeConfig) -> Result<Vec<Vec<u32>>, Self::Error> {
///         Ok(prompts
///             .iter()
///             .map(|p| p.bytes().take(config.truncate_to).map(u32::from).collect())
///             .collect())
///     }
/// }
///
/// let ids = ByteTokenizer.tokenize(&["ab".to_string()], &TokenizeConfig::default()).unwrap();
/// assert_eq!(ids, vec![vec![97, 98]]);
/// ```
pub trait Tokenizer: Send + Sync {
    /// The tokenizer's own failure type, surfaced to callers untouched
    type Error: Debug + Display + Send + 'static;

    /// Tokenizes `prompts`.
    ///
    /// # Parameters
    ///
    /// * `prompts` - Raw input strings
    /// * `config` - Truncation and special-token handling
    ///
    /// # Returns
    ///
    /// One id sequence per prompt, in prompt order
    fn tokenize(&self, prompts: &[String], config: &TokenizeConfig) -> Result<Vec<Vec<u32>>, Self::Error>;
}

/// # Inference
///
/// A sequence model that turns one [`Batch`] into one output string per sequence.
///
/// Every sequence of a batch has the same length, so implementors can lay the batch out
/// as a dense `(items, length)` block without padding.
///
/// ## Contract
///
/// * One output per sequence, in batch order
/// * Generation parameters are opaque to the pipeline and passed through unchanged
/// * Failures are returned, not retried: only the implementor knows whether a device or
///   memory condition is transient
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use sortbatch::Batch;
/// use sortbatch::collaborator::Inference;
/// use sortbatch::config::GenerationConfig;
///
/// struct LengthModel;
///
/// #[async_trait]
/// impl Inference for LengthModel {
///     type Error = std::convert::Infallible;
///
///     async fn generate(&self, batch: &Batch, _params: &GenerationConfig) -> Result<Vec<String>, Self::Error> {
///         Ok(batch.iter().map(|s| format!("{} tokens", s.len())).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait Inference: Send + Sync {
    /// The model's own failure type, surfaced to callers untouched
    type Error: Debug + Display + Send + 'static;

    /// Runs the model over `batch`.
    ///
    /// # Parameters
    ///
    /// * `batch` - Equal-length sequences to process together
    /// * `params` - Output length, beam width and repetition penalty
    ///
    /// # Returns
    ///
    /// One decoded output per sequence, in batch order
    async fn generate(&self, batch: &Batch, params: &GenerationConfig) -> Result<Vec<String>, Self::Error>;
}
