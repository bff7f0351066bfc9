use std::iter::Peekable;
use std::vec::IntoIter;
use uuid::Uuid;
use crate::batch::Batch;
use crate::bucket::LengthGroup;
use crate::error::BatchError;
use crate::sequence::Sequence;
use super::policy::{BatchPolicy, Limit};

/// Where the packer is in its walk over the length groups.
///
/// ```text
/// Idle ──open group──▶ Accumulating ──flush batch──▶ Accumulating ─┐
///  ▲                                                              │
///  └──────────────────────── group exhausted ◀────────────────────┘
/// Idle ──no groups left──▶ Done
/// ```
///
/// A batch is only ever filled from the `pending` items of the group being
/// accumulated, so a leftover partial batch is flushed at the group boundary
/// instead of carrying over into the next length.
enum PackState {
    /// Between groups; the next pull opens the next length group
    Idle,

    /// Drawing batches from the items of one length group
    Accumulating {
        pending: Peekable<IntoIter<Sequence>>,
    },

    /// Every group has been packed
    Done,
}

/// A demand-driven packer over ascending length groups.
///
/// Each call to [`Packer::next_batch`] does work proportional to the size of the batch it
/// returns. Dropping the packer part-way through is always safe; unpacked sequences are
/// simply freed.
pub(crate) struct Packer {
    /// The policy, pinned to concrete numbers for this invocation
    limit: Limit,

    /// Length groups not yet opened, ascending
    groups: IntoIter<LengthGroup>,

    state: PackState,

    /// Correlates log events of one invocation
    plan_id: Uuid,
}

impl Packer {
    /// Creates a packer over `groups`, which must be in ascending length order.
    ///
    /// # Parameters
    ///
    /// * `groups` - Output of [`bucket`](crate::bucket::bucket)
    /// * `policy` - The sizing policy to apply
    /// * `plan_id` - Identifier recorded on every log event of this invocation
    ///
    /// # Returns
    ///
    /// `Err(BatchError::InvalidConfiguration)` if the policy can never admit a batch
    pub(crate) fn new(groups: Vec<LengthGroup>, policy: &BatchPolicy, plan_id: Uuid) -> Result<Self, BatchError> {
        let longest = groups.last().map_or(0, LengthGroup::length);
        let limit = policy.resolve(longest)?;
        tracing::debug!(
            plan = %plan_id,
            groups = groups.len(),
            longest,
            limit = ?limit,
            "packer ready"
        );
        Ok(Self {
            limit,
            groups: groups.into_iter(),
            state: PackState::Idle,
            plan_id,
        })
    }

    /// Packs and returns the next batch, or `None` once every group is exhausted.
    pub(crate) fn next_batch(&mut self) -> Option<Batch> {
        loop {
            match &mut self.state {
                PackState::Done => return None,
                PackState::Idle => self.state = self.open_next_group(),
                PackState::Accumulating { pending } => {
                    if pending.peek().is_none() {
                        self.state = PackState::Idle;
                        continue;
                    }
                    return Some(Self::flush(&self.limit, pending));
                }
            }
        }
    }

    /// Moves to the next length group, or to `Done` if none remain.
    fn open_next_group(&mut self) -> PackState {
        let Some(group) = self.groups.next() else {
            return PackState::Done;
        };

        tracing::trace!(
            plan = %self.plan_id,
            length = group.length(),
            items = group.len(),
            "opening length group"
        );
        if self.limit.is_oversized(group.length()) {
            tracing::warn!(
                plan = %self.plan_id,
                length = group.length(),
                items = group.len(),
                "sequences exceed the token budget, each runs as its own batch"
            );
        }

        PackState::Accumulating {
            pending: group.into_sequences().into_iter().peekable(),
        }
    }

    /// Greedily takes items from `pending` until the next one would break `limit`.
    ///
    /// The first item is always taken, so the returned batch is never empty.
    fn flush(limit: &Limit, pending: &mut Peekable<IntoIter<Sequence>>) -> Batch {
        let mut sequences = Vec::new();
        let mut tokens = 0;
        while let Some(next) = pending.next_if(|next| limit.admits(sequences.len(), tokens, next)) {
            tokens += next.len();
            sequences.push(next);
        }
        Batch::new(sequences)
    }
}

impl Iterator for Packer {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}

impl std::iter::FusedIterator for Packer {}
