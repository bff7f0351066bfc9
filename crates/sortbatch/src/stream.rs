//! # Batch Stream
//!
//! A pull-based, single-pass view over one invocation's [`BatchPlan`].
//!
//! ## Behaviour
//!
//! * Nothing is bucketed or packed until the first pull.
//! * The first pull validates the policy. An invalid policy yields exactly one
//!   `Err(BatchError::InvalidConfiguration)` and then ends, so a caller never sees valid
//!   batches followed by a configuration failure.
//! * Every later pull packs exactly one batch. Peak memory is the unpacked input plus
//!   that one batch; batches already yielded belong to the caller.
//! * Exhaustion is reported as `None`, like any other iterator.
//! * Dropping the stream early releases everything it holds.

use std::iter::FusedIterator;
use uuid::Uuid;
use crate::batch::{Batch, BatchPlan};
use crate::bucket::bucket;
use crate::error::BatchError;
use crate::packer::{BatchPolicy, Packer};
use crate::sequence::Sequence;

enum StreamState {
    /// Not yet pulled; holds the raw input
    Pending {
        sequences: Vec<Sequence>,
        policy: BatchPolicy,
    },

    /// Packing one batch per pull
    Packing(Packer),

    /// Exhausted, or failed on the first pull
    Finished,
}

/// A lazily produced sequence of [`Batch`]es.
///
/// # Example
///
/// ```
/// use sortbatch::{BatchPolicy, BatchStream, SequenceStore};
///
/// let store = SequenceStore::from_token_ids(vec![
///     vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![10, 11, 12, 13, 14], vec![15, 16, 17, 18, 19],
/// ]);
///
/// let sizes: Vec<usize> = BatchStream::new(store, BatchPolicy::token_budget(8))
///     .map(|batch| batch.map(|b| b.item_count()))
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(sizes, vec![2, 1, 1, 1]);
/// ```
pub struct BatchStream {
    /// Identifies this invocation on every log event
    plan_id: Uuid,

    state: StreamState,

    /// Batches yielded so far
    batches: usize,

    /// Sequences yielded so far
    items: usize,

    /// Tokens yielded so far
    tokens: usize,
}

impl BatchStream {
    /// Creates a stream over `sequences`, deferring all work to the first pull.
    ///
    /// # Parameters
    ///
    /// * `sequences` - Tokenized inputs; empty ones are dropped
    /// * `policy` - The sizing policy, validated on the first pull
    pub fn new<I>(sequences: I, policy: BatchPolicy) -> Self
    where I: IntoIterator<Item = Sequence>
    {
        Self {
            plan_id: Uuid::new_v4(),
            state: StreamState::Pending {
                sequences: sequences.into_iter().collect(),
                policy,
            },
            batches: 0,
            items: 0,
            tokens: 0,
        }
    }

    /// Identifier recorded on this stream's log events.
    pub fn plan_id(&self) -> Uuid {
        self.plan_id
    }

    /// Drains the rest of the stream into a [`BatchPlan`].
    ///
    /// # Returns
    ///
    /// The remaining batches, or the configuration error if the stream had not been
    /// pulled yet and its policy is invalid
    pub fn into_plan(self) -> Result<BatchPlan, BatchError> {
        self.collect::<Result<Vec<_>, _>>().map(BatchPlan::new)
    }

    /// Advances the state machine by one pull.
    fn pull(&mut self) -> Option<Result<Batch, BatchError>> {
        loop {
            match std::mem::replace(&mut self.state, StreamState::Finished) {
                StreamState::Finished => return None,
                StreamState::Pending { sequences, policy } => {
                    match Packer::new(bucket(sequences), &policy, self.plan_id) {
                        Ok(packer) => self.state = StreamState::Packing(packer),
                        Err(err) => {
                            tracing::warn!(plan = %self.plan_id, error = %err, "rejecting batch plan");
                            return Some(Err(err));
                        }
                    }
                }
                StreamState::Packing(mut packer) => {
                    let Some(batch) = packer.next_batch() else {
                        tracing::info!(
                            plan = %self.plan_id,
                            batches = self.batches,
                            items = self.items,
                            tokens = self.tokens,
                            "batch plan exhausted"
                        );
                        return None;
                    };
                    self.state = StreamState::Packing(packer);
                    self.batches += 1;
                    self.items += batch.item_count();
                    self.tokens += batch.token_count();
                    tracing::debug!(
                        plan = %self.plan_id,
                        length = batch.sequence_length(),
                        items = batch.item_count(),
                        tokens = batch.token_count(),
                        "batch ready"
                    );
                    return Some(Ok(batch));
                }
            }
        }
    }
}

impl Iterator for BatchStream {
    type Item = Result<Batch, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pull()
    }
}

impl FusedIterator for BatchStream {}
