//! # Batch Packer
//!
//! Turns ascending [`LengthGroup`]s into [`Batch`]es under a [`BatchPolicy`].
//!
//! ## Policies
//!
//! * [`BatchPolicy::TokenBudget`] - Greedily fills a batch until the next item would push
//!   its token count past the budget. An item longer than the budget is never split or
//!   dropped; it runs as a batch of one.
//! * [`BatchPolicy::FixedCount`] - Splits each group into contiguous chunks of at most
//!   `max_items` items.
//!
//! Under either policy a batch is drawn from a single length group: whatever is left
//! of a group is flushed before the next, longer group is opened.
//!
//! The eager helpers here collect the whole plan at once. Callers that want one batch
//! at a time should use [`BatchStream`](crate::stream::BatchStream).

mod policy;
mod state;

pub use policy::{BatchPolicy, TokenBudget};
pub(crate) use state::Packer;

use uuid::Uuid;
use crate::batch::Batch;
use crate::bucket::LengthGroup;
use crate::error::BatchError;

/// Packs `length_groups` under `policy`.
///
/// # Parameters
///
/// * `length_groups` - Groups in ascending length order, as produced by
///   [`bucket`](crate::bucket::bucket)
/// * `policy` - The sizing policy
///
/// # Returns
///
/// Every batch in yield order, or `InvalidConfiguration` before any packing is done
pub fn pack(length_groups: Vec<LengthGroup>, policy: &BatchPolicy) -> Result<Vec<Batch>, BatchError> {
    Ok(Packer::new(length_groups, policy, Uuid::new_v4())?.collect())
}

/// Packs under a fixed token budget.
///
/// `budget == 0` fails with [`BatchError::InvalidConfiguration`].
pub fn pack_by_budget(length_groups: Vec<LengthGroup>, budget: usize) -> Result<Vec<Batch>, BatchError> {
    pack(length_groups, &BatchPolicy::token_budget(budget))
}

/// Packs at most `max_items` sequences per batch.
///
/// `max_items == 0` fails with [`BatchError::InvalidConfiguration`].
pub fn pack_by_count(length_groups: Vec<LengthGroup>, max_items: usize) -> Result<Vec<Batch>, BatchError> {
    pack(length_groups, &BatchPolicy::fixed_count(max_items))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use std::collections::HashSet;
    use proptest::prelude::*;
    use crate::bucket::bucket;
    use crate::sequence::{Sequence, SequenceStore};

    fn store_strategy() -> impl Strategy<Value = SequenceStore> {
        prop::collection::vec(0usize..12, 0..64).prop_map(|lengths| {
            lengths
                .into_iter()
                .enumerate()
                .map(|(i, len)| vec![i as u32; len])
                .collect()
        })
    }

    fn policy_strategy() -> impl Strategy<Value = BatchPolicy> {
        prop_oneof![
            (1usize..40).prop_map(BatchPolicy::token_budget),
            Just(BatchPolicy::longest_sequence()),
            (1usize..10).prop_map(BatchPolicy::fixed_count),
        ]
    }

    proptest! {
        #[test]
        fn prop_every_non_empty_item_appears_exactly_once(store in store_strategy(), policy in policy_strategy()) {
            let expected: HashSet<usize> = store
                .iter()
                .filter(|s| !s.is_empty())
                .map(Sequence::index)
                .collect();
            let batches = pack(bucket(store), &policy).unwrap();
            let packed: Vec<usize> = batches.iter().flat_map(Batch::indices).collect();
            let unique: HashSet<usize> = packed.iter().copied().collect();
            prop_assert_eq!(packed.len(), unique.len());
            prop_assert_eq!(unique, expected);
        }

        #[test]
        fn prop_budget_respected_or_single_item(store in store_strategy(), budget in 1usize..40) {
            for batch in pack(bucket(store), &BatchPolicy::token_budget(budget)).unwrap() {
                prop_assert!(batch.token_count() <= budget || batch.item_count() == 1);
            }
        }

        #[test]
        fn prop_item_count_respected(store in store_strategy(), max_items in 1usize..10) {
            for batch in pack(bucket(store), &BatchPolicy::fixed_count(max_items)).unwrap() {
                prop_assert!(batch.item_count() <= max_items);
            }
        }

        #[test]
        fn prop_batches_are_monotonic_by_length(store in store_strategy(), policy in policy_strategy()) {
            let batches = pack(bucket(store), &policy).unwrap();
            for pair in batches.windows(2) {
                prop_assert!(pair[0].min_length() <= pair[1].min_length());
            }
        }

        #[test]
        fn prop_packing_is_deterministic(store in store_strategy(), policy in policy_strategy()) {
            let first = pack(bucket(store.clone()), &policy).unwrap();
            let second = pack(bucket(store), &policy).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_batches_hold_one_non_zero_length(store in store_strategy(), policy in policy_strategy()) {
            for batch in pack(bucket(store), &policy).unwrap() {
                let length = batch.sequence_length();
                prop_assert!(length > 0);
                prop_assert!(batch.iter().all(|s| s.len() == length));
            }
        }
    }
}
