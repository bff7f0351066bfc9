/// # Constants with reserved meanings in sortbatch

/// In a batch tensor, the `0th` dimension indexes the items of the batch
pub const BATCH_DIM: usize = 0;

/// In a batch tensor, the `1st` dimension indexes token positions
pub const SEQ_DIM: usize = 1;

/// Number of tokens kept per input when no truncation length is configured
pub const DEFAULT_TRUNCATE_TO: usize = 128;

/// Default cap on generated sequence length handed to the inference collaborator
pub const DEFAULT_MAX_OUTPUT_LENGTH: usize = 256;

/// Default beam width handed to the inference collaborator
pub const DEFAULT_BEAM_WIDTH: usize = 2;

/// Default repetition penalty handed to the inference collaborator
pub const DEFAULT_REPETITION_PENALTY: f32 = 1.5;

/// Default item cap for the fixed-count policy
pub const DEFAULT_MAX_ITEMS: usize = 4;
