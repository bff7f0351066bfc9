//! # Sorted Batch Inference
//!
//! Drives prompts end to end: tokenize, bucket by exact length, pack under a
//! [`BatchPolicy`](crate::packer::BatchPolicy), then run the model one batch at a time.
//!
//! ## Flow
//!
//! ```text
//!  prompts ──► Tokenizer ──► SequenceStore ──► BatchStream ──► Inference ──► OutputStream
//!                                                  ▲                               │
//!                                                  └───────── one poll ────────────┘
//! ```
//!
//! The collaborators are traits ([`Tokenizer`](crate::collaborator::Tokenizer),
//! [`Inference`](crate::collaborator::Inference)), so any tokenizer or model can be plugged
//! in. Their errors reach the caller unchanged inside
//! [`PipelineError`](crate::error::PipelineError).

mod batcher;
mod output_stream;

pub use batcher::{RunError, SortedBatchInference};
pub use output_stream::{BatchOutput, OutputStream};
