use serde::{Deserialize, Serialize};
use crate::constant::DEFAULT_MAX_ITEMS;
use crate::error::BatchError;
use crate::sequence::Sequence;

/// How large a batch may grow.
///
/// Both policies walk length groups in ascending order and never let a batch span two
/// groups; they differ only in when the running batch is closed.
///
/// # Serialization
///
/// The policy is internally tagged so it reads naturally from a host config file:
///
/// ```
/// use sortbatch::packer::{BatchPolicy, TokenBudget};
///
/// let policy: BatchPolicy = serde_json::from_str(
///     r#"{ "policy": "token_budget", "budget": { "fixed": 512 } }"#
/// ).unwrap();
/// assert_eq!(policy, BatchPolicy::token_budget(512));
///
/// let policy: BatchPolicy = serde_json::from_str(
///     r#"{ "policy": "fixed_count", "max_items": 8 }"#
/// ).unwrap();
/// assert_eq!(policy, BatchPolicy::fixed_count(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Close a batch once the next item would push its token count past the budget.
    ///
    /// Appropriate when compute and memory scale with total tokens.
    TokenBudget {
        #[serde(default)]
        budget: TokenBudget,
    },

    /// Close a batch once it holds `max_items` sequences.
    ///
    /// Appropriate when the downstream engine already batches by length internally and
    /// only needs a coarse cap on concurrent items.
    FixedCount {
        #[serde(default = "default_max_items")]
        max_items: usize,
    },
}

/// The token ceiling used by [`BatchPolicy::TokenBudget`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenBudget {
    /// A fixed number of tokens per batch.
    Fixed(usize),

    /// The length of the longest non-empty input of the invocation, so the longest
    /// sequences run alone and shorter ones share a batch up to the same footprint.
    #[default]
    LongestSequence,
}

impl BatchPolicy {
    /// Token-budget policy with a fixed ceiling of `budget` tokens.
    pub fn token_budget(budget: usize) -> Self {
        Self::TokenBudget {
            budget: TokenBudget::Fixed(budget),
        }
    }

    /// Token-budget policy whose ceiling is the longest input of the invocation.
    pub fn longest_sequence() -> Self {
        Self::TokenBudget {
            budget: TokenBudget::LongestSequence,
        }
    }

    /// Fixed-count policy with at most `max_items` sequences per batch.
    pub fn fixed_count(max_items: usize) -> Self {
        Self::FixedCount { max_items }
    }

    /// Rejects sizing parameters that could never admit a batch.
    ///
    /// # Returns
    ///
    /// `Err(BatchError::InvalidConfiguration)` for a zero fixed budget or a zero item cap
    pub fn validate(&self) -> Result<(), BatchError> {
        match self {
            BatchPolicy::TokenBudget { budget: TokenBudget::Fixed(0) } => Err(
                BatchError::InvalidConfiguration("token budget must be positive".to_string()),
            ),
            BatchPolicy::FixedCount { max_items: 0 } => Err(
                BatchError::InvalidConfiguration("max items per batch must be positive".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Pins the policy to concrete numbers for one invocation.
    ///
    /// # Parameters
    ///
    /// * `longest` - Length of the longest non-empty input, `0` if there is none
    pub(crate) fn resolve(&self, longest: usize) -> Result<Limit, BatchError> {
        self.validate()?;
        let limit = match *self {
            BatchPolicy::TokenBudget { budget: TokenBudget::Fixed(budget) } => Limit::Tokens(budget),
            BatchPolicy::TokenBudget { budget: TokenBudget::LongestSequence } => Limit::Tokens(longest.max(1)),
            BatchPolicy::FixedCount { max_items } => Limit::Items(max_items),
        };
        Ok(limit)
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::longest_sequence()
    }
}

/// A policy resolved against one invocation's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Limit {
    /// At most this many tokens per batch, unless a lone item is larger
    Tokens(usize),

    /// At most this many items per batch
    Items(usize),
}

impl Limit {
    /// Whether `next` may join a running batch holding `items` sequences and `tokens` tokens.
    ///
    /// An empty batch admits anything, so an oversized item still gets a batch of its own.
    pub(crate) fn admits(&self, items: usize, tokens: usize, next: &Sequence) -> bool {
        if items == 0 {
            return true;
        }
        match *self {
            Limit::Tokens(budget) => tokens + next.len() <= budget,
            Limit::Items(max_items) => items < max_items,
        }
    }

    /// Whether a lone sequence of `length` tokens already breaks the limit.
    pub(crate) fn is_oversized(&self, length: usize) -> bool {
        matches!(*self, Limit::Tokens(budget) if length > budget)
    }
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
