//! # Configuration
//!
//! Plain configuration values for the pipeline. Every struct derives `serde` traits and
//! fills missing fields with defaults, so a host application can embed them in its own
//! configuration file. The library itself never reads files or the environment.
//!
//! Tokenization and generation parameters are opaque to batching: they are passed through
//! to the collaborators unchanged.

use serde::{Deserialize, Serialize};
use crate::constant::{
    DEFAULT_BEAM_WIDTH,
    DEFAULT_MAX_OUTPUT_LENGTH,
    DEFAULT_REPETITION_PENALTY,
    DEFAULT_TRUNCATE_TO,
};
use crate::error::BatchError;
use crate::packer::BatchPolicy;

/// Parameters handed to the [`Tokenizer`](crate::collaborator::Tokenizer) collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizeConfig {
    /// Keep at most this many tokens per input
    pub truncate_to: usize,

    /// Leave out special tokens such as BOS/EOS markers
    pub drop_special_tokens: bool,
}

impl Default for TokenizeConfig {
    fn default() -> Self {
        Self {
            truncate_to: DEFAULT_TRUNCATE_TO,
            drop_special_tokens: true,
        }
    }
}

/// Parameters handed to the [`Inference`](crate::collaborator::Inference) collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Cap on the length of each generated sequence
    pub max_output_length: usize,

    /// Number of beams searched per input
    pub beam_width: usize,

    /// Penalty applied to repeated tokens
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_length: DEFAULT_MAX_OUTPUT_LENGTH,
            beam_width: DEFAULT_BEAM_WIDTH,
            repetition_penalty: DEFAULT_REPETITION_PENALTY,
        }
    }
}

/// Everything [`SortedBatchInference`](crate::pipeline::SortedBatchInference) needs for one
/// deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tokenize: TokenizeConfig,
    pub generation: GenerationConfig,
    pub policy: BatchPolicy,
}

impl PipelineConfig {
    /// Creates a configuration with default collaborator parameters and the given policy.
    pub fn with_policy(policy: BatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Checks the parts of the configuration that batching depends on.
    pub fn validate(&self) -> Result<(), BatchError> {
        self.policy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.tokenize.truncate_to, 128);
        assert!(config.tokenize.drop_special_tokens);
        assert_eq!(config.generation.max_output_length, 256);
        assert_eq!(config.generation.beam_width, 2);
        assert_eq!(config.generation.repetition_penalty, 1.5);
        assert_eq!(config.policy, BatchPolicy::longest_sequence());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{
                "tokenize": { "truncate_to": 64 },
                "policy": { "policy": "fixed_count", "max_items": 4 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.tokenize.truncate_to, 64);
        assert!(config.tokenize.drop_special_tokens);
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.policy, BatchPolicy::fixed_count(4));
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_validate_delegates_to_policy() {
        assert!(PipelineConfig::with_policy(BatchPolicy::token_budget(0)).validate().is_err());
        assert!(PipelineConfig::with_policy(BatchPolicy::token_budget(32)).validate().is_ok());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = serde_json::from_str::<PipelineConfig>(r#"{ "policy": { "policy": "round_robin" } }"#);
        assert!(result.is_err());
    }
}
