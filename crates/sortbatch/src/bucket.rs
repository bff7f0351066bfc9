//! # Length Bucketer
//!
//! Groups sequences by exact token length so that packing never mixes lengths inside a
//! batch, which keeps padding waste at zero and compute proportional to useful tokens.

use std::collections::BTreeMap;
use crate::sequence::Sequence;

/// All sequences of one exact length, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthGroup {
    /// Token length shared by every sequence in the group
    length: usize,

    /// Sequences of exactly `length` tokens
    sequences: Vec<Sequence>,
}

impl LengthGroup {
    /// The token length shared by every member.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of sequences in the group.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Total tokens held by the group.
    pub fn token_count(&self) -> usize {
        self.length * self.sequences.len()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn into_sequences(self) -> Vec<Sequence> {
        self.sequences
    }
}

/// Buckets `sequences` by length.
///
/// # Parameters
///
/// * `sequences` - Tokenized inputs in arrival order
///
/// # Returns
///
/// One [`LengthGroup`] per distinct non-zero length, ordered by strictly ascending
/// length. Within a group, sequences keep their arrival order. Zero-length sequences
/// are dropped; an input with no non-empty sequence yields an empty vector.
pub fn bucket<I>(sequences: I) -> Vec<LengthGroup>
where I: IntoIterator<Item = Sequence>
{
    let mut by_length: BTreeMap<usize, Vec<Sequence>> = BTreeMap::new();
    let mut dropped = 0usize;

    for sequence in sequences {
        if sequence.is_empty() {
            dropped += 1;
            continue;
        }
        by_length.entry(sequence.len()).or_default().push(sequence);
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped empty sequences before bucketing");
    }

    by_length
        .into_iter()
        .map(|(length, sequences)| LengthGroup { length, sequences })
        .collect()
}
