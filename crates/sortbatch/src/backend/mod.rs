//! # Backends
//!
//! Optional glue between batches and the libraries that consume them.
//!
//! ## Feature Flags
//!
//! - `candle`: Lays a [`Batch`](crate::batch::Batch) out as a dense candle `Tensor`
//! - `tokenizers`: Implements [`Tokenizer`](crate::collaborator::Tokenizer) for Hugging Face
//!   `tokenizers::Tokenizer`
//!
//! Neither is needed to bucket, pack or stream batches.

#[cfg_attr(docsrs, doc(cfg(feature = "candle")))]
#[cfg(feature = "candle")]
/// Candle tensor layout for batches.
///
/// This module is only available when the `candle` feature flag is enabled.
/// Because every sequence of a batch shares one length, the tensor is built directly
/// with shape `(items, length)`; no padding or attention mask is required.
pub mod candle;

#[cfg_attr(docsrs, doc(cfg(feature = "tokenizers")))]
#[cfg(feature = "tokenizers")]
/// Hugging Face tokenizer collaborator.
///
/// This module is only available when the `tokenizers` feature flag is enabled.
pub mod tokenizers;

#[cfg(test)]
/// Mock collaborators.
///
/// Character-level tokenizer and an echoing model with failure injection
pub(crate) mod mock;
