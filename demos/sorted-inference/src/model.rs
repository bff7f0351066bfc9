use std::convert::Infallible;
use std::time::Duration;
use async_trait::async_trait;
use candle_core::{DType, Device};
use rand::{thread_rng, Rng};
use sortbatch::Batch;
use sortbatch::collaborator::{Inference, Tokenizer};
use sortbatch::config::{GenerationConfig, TokenizeConfig};
use sortbatch::constant::SEQ_DIM;

/// Splits on whitespace and hashes each word into a small vocabulary.
pub struct WordTokenizer {
    vocab_size: u32,
}

impl WordTokenizer {
    pub fn new(vocab_size: u32) -> Self {
        Self { vocab_size }
    }
}

impl Tokenizer for WordTokenizer {
    type Error = Infallible;

    fn tokenize(&self, prompts: &[String], config: &TokenizeConfig) -> Result<Vec<Vec<u32>>, Infallible> {
        Ok(prompts
            .iter()
            .map(|prompt| {
                prompt
                    .split_whitespace()
                    .take(config.truncate_to)
                    .map(|word| word.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b))) % self.vocab_size)
                    .collect()
            })
            .collect())
    }
}

/// Stand-in for a sequence model: lays the batch out as a tensor, sleeps for a cost
/// proportional to its size, and reports each row's checksum.
pub struct ChecksumModel {
    device: Device,
}

impl ChecksumModel {
    pub fn new() -> Self {
        Self { device: Device::Cpu }
    }
}

#[async_trait]
impl Inference for ChecksumModel {
    type Error = candle_core::Error;

    async fn generate(&self, batch: &Batch, params: &GenerationConfig) -> Result<Vec<String>, Self::Error> {
        let tensor = batch.to_tensor(&self.device)?;
        let sums = tensor.to_dtype(DType::F32)?.sum(SEQ_DIM)?.to_vec1::<f32>()?;

        let jitter = thread_rng().gen_range(0..5);
        tokio::time::sleep(Duration::from_millis(batch.token_count() as u64 / 4 + jitter)).await;

        Ok(sums
            .into_iter()
            .map(|sum| format!("checksum {sum} (beams {}, max {})", params.beam_width, params.max_output_length))
            .collect())
    }
}
