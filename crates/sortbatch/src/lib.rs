//! # Sortbatch
//!
//! Length-**sort**ed **batch**ing of tokenized sequences for efficient model inference.
//!
//! ## Overview
//!
//! Models run fastest over batches of equal-length inputs: nothing is wasted on padding
//! and one dense tensor holds the whole batch. This library takes a list of tokenized
//! inputs, groups them by exact token length, and packs each group into batches under a
//! configurable sizing policy. Batches come out shortest first, one at a time, and every
//! sequence remembers which input it came from so results can be put back in order.
//!
//! Key components include:
//!
//! - A sequence store holding tokenizer output with input positions
//! - A length bucketer producing ascending, uniform-length groups
//! - A batch packer with token-budget and fixed-count policies
//! - A lazy batch stream that packs on demand
//! - A tokenize → batch → infer pipeline over pluggable collaborators
//! - A scoped timing harness
//!
//! ## Architecture
//!
//! ### Assumptions
//! Regardless of backend used, sortbatch reserves two dimensions with special meanings:
//!  - The `0th` dimension is reserved as the batch dimension
//!  - The `1st` dimension is reserved as the sequence dimension
//!
//! ### Batching
//!
//! [`SequenceStore`] → [`bucket`] → [`pack`] (or [`BatchStream`]) → [`Batch`]. Every batch
//! is drawn from a single length group, every sequence lands in exactly one batch, and
//! empty sequences are dropped. The whole path is synchronous and deterministic.
//!
//! ### Collaborators
//!
//! The [`Tokenizer`](collaborator::Tokenizer) and [`Inference`](collaborator::Inference)
//! traits define what a tokenizer and a model must provide. [`SortedBatchInference`] wires
//! them around the batching core and exposes results as an async
//! [`OutputStream`](pipeline::OutputStream).
//!
//! ## Features
//!
//! - **candle** - Lays batches out as candle tensors
//! - **tokenizers** - Implements the tokenizer collaborator for Hugging Face tokenizers
//!
//! ## Example
//!
//! ```rust
//! use sortbatch::{BatchPolicy, SequenceStore, bucket, pack};
//!
//! let store = SequenceStore::from_token_ids(vec![vec![5, 6, 7], vec![1], vec![], vec![2]]);
//! let batches = pack(bucket(store), &BatchPolicy::token_budget(2)).unwrap();
//!
//! let indices: Vec<Vec<usize>> = batches.iter().map(|b| b.indices()).collect();
//! assert_eq!(indices, vec![vec![1, 3], vec![0]]);
//! ```

pub mod backend;
pub mod batch;
pub mod bucket;
pub mod collaborator;
pub mod config;
pub mod constant;
pub mod error;
pub mod packer;
pub mod pipeline;
pub mod sequence;
pub mod stream;
pub mod timing;

pub use batch::{Batch, BatchPlan};
pub use bucket::{LengthGroup, bucket};
pub use config::PipelineConfig;
pub use error::{BatchError, PipelineError};
pub use packer::{BatchPolicy, TokenBudget, pack, pack_by_budget, pack_by_count};
pub use pipeline::SortedBatchInference;
pub use sequence::{Sequence, SequenceStore};
pub use stream::BatchStream;
