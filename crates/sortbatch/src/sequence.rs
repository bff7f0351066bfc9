//! # Sequence Store
//!
//! Tokenized inputs and the store that holds them before bucketing.
//!
//! A [`Sequence`] remembers the position of the prompt it was produced from, so that
//! results can be routed back to their input after length sorting has reordered the work.

/// One tokenized input item.
///
/// A sequence owns its token ids and records `index`, its position in the original
/// input list. Sequences of length zero are legal to construct but are dropped by the
/// bucketer and never reach a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    /// Position of the originating prompt in the caller's input
    index: usize,

    /// Token ids, in order
    ids: Vec<u32>,
}

impl Sequence {
    /// Creates a sequence for the input at `index`.
    pub fn new(index: usize, ids: Vec<u32>) -> Self {
        Self { index, ids }
    }

    /// Position of the originating prompt in the caller's input.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of token ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// `true` when the sequence carries no tokens.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The token ids.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Consumes the sequence, returning its token ids.
    pub fn into_ids(self) -> Vec<u32> {
        self.ids
    }
}

impl AsRef<[u32]> for Sequence {
    fn as_ref(&self) -> &[u32] {
        &self.ids
    }
}

/// The raw output of the tokenizer for one invocation.
///
/// The store keeps every sequence it was given, empty ones included, in arrival order.
/// Filtering happens in [`bucket`](crate::bucket::bucket).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceStore {
    sequences: Vec<Sequence>,
}

impl SequenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from tokenizer output, indexing each sequence by its position.
    ///
    /// # Parameters
    ///
    /// * `token_ids` - One id list per input prompt, in prompt order
    ///
    /// # Returns
    ///
    /// A store whose `i`th sequence has `index() == i`
    pub fn from_token_ids<I>(token_ids: I) -> Self
    where I: IntoIterator<Item = Vec<u32>>
    {
        let mut store = Self::new();
        token_ids.into_iter().for_each(|ids| store.push(ids));
        store
    }

    /// Appends a sequence, indexing it after the ones already held.
    pub fn push(&mut self, ids: Vec<u32>) {
        let index = self.sequences.len();
        self.sequences.push(Sequence::new(index, ids));
    }

    /// Number of sequences held, empty ones included.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Length of every sequence, in arrival order.
    pub fn lengths(&self) -> Vec<usize> {
        self.sequences.iter().map(Sequence::len).collect()
    }

    /// Number of sequences that carry at least one token.
    pub fn non_empty_count(&self) -> usize {
        self.sequences.iter().filter(|s| !s.is_empty()).count()
    }

    /// Length of the longest sequence, or `None` for an empty store.
    pub fn max_length(&self) -> Option<usize> {
        self.sequences.iter().map(Sequence::len).max()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    /// Hands every held sequence over, in arrival order.
    pub fn into_sequences(self) -> Vec<Sequence> {
        self.sequences
    }
}

impl FromIterator<Vec<u32>> for SequenceStore {
    fn from_iter<I: IntoIterator<Item = Vec<u32>>>(iter: I) -> Self {
        Self::from_token_ids(iter)
    }
}

impl IntoIterator for SequenceStore {
    type Item = Sequence;
    type IntoIter = std::vec::IntoIter<Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.into_iter()
    }
}
