//! # Batches
//!
//! A [`Batch`] is the unit handed to the inference collaborator; a [`BatchPlan`] is every
//! batch of one invocation, materialized.
//!
//! Batches are only ever produced by the packer, which draws each one from a single
//! length group. Every sequence in a batch therefore has the same length, and a batch
//! is never empty.

use crate::sequence::Sequence;

/// An ordered, non-empty group of equal-length sequences.
///
/// Ownership passes to the consumer when the batch is yielded; the packer keeps no
/// reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    sequences: Vec<Sequence>,

    /// Sum of the lengths of `sequences`
    token_count: usize,
}

impl Batch {
    /// Wraps packed sequences. Callers guarantee `sequences` is non-empty.
    pub(crate) fn new(sequences: Vec<Sequence>) -> Self {
        debug_assert!(!sequences.is_empty(), "batches are never empty");
        let token_count = sequences.iter().map(Sequence::len).sum();
        Self {
            sequences,
            token_count,
        }
    }

    /// Number of sequences in the batch.
    pub fn item_count(&self) -> usize {
        self.sequences.len()
    }

    /// Sum of the token lengths of every sequence in the batch.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Token length shared by the sequences of this batch.
    pub fn sequence_length(&self) -> usize {
        self.sequences.first().map_or(0, Sequence::len)
    }

    /// Shortest sequence length in the batch.
    pub fn min_length(&self) -> usize {
        self.sequences.iter().map(Sequence::len).min().unwrap_or(0)
    }

    /// Input positions of the batch's sequences, in batch order.
    pub fn indices(&self) -> Vec<usize> {
        self.sequences.iter().map(Sequence::index).collect()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    pub fn into_sequences(self) -> Vec<Sequence> {
        self.sequences
    }
}

impl IntoIterator for Batch {
    type Item = Sequence;
    type IntoIter = std::vec::IntoIter<Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

/// The full, ordered list of batches produced for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Batch>,
}

impl BatchPlan {
    pub(crate) fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    /// Number of batches in the plan.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of sequences across every batch.
    pub fn item_count(&self) -> usize {
        self.batches.iter().map(Batch::item_count).sum()
    }

    /// Number of tokens across every batch.
    pub fn token_count(&self) -> usize {
        self.batches.iter().map(Batch::token_count).sum()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<Batch> {
        self.batches
    }
}

impl IntoIterator for BatchPlan {
    type Item = Batch;
    type IntoIter = std::vec::IntoIter<Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.into_iter()
    }
}
