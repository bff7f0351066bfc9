use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use crate::batch::Batch;
use crate::collaborator::{Inference, Tokenizer};
use crate::config::{GenerationConfig, TokenizeConfig};

// One token per char, so a prompt's length is its token count
#[derive(Debug, Default)]
pub struct MockTokenizer {
    calls: AtomicUsize,
    fail: bool,
    drop_last: bool,
}

impl MockTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Returns one sequence fewer than it was given.
    pub fn dropping_last_prompt(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Tokenizer for MockTokenizer {
    type Error = String;

    fn tokenize(&self, prompts: &[String], config: &TokenizeConfig) -> Result<Vec<Vec<u32>>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("tokenizer offline".to_string());
        }

        let mut ids: Vec<Vec<u32>> = prompts
            .iter()
            .map(|prompt| prompt.chars().take(config.truncate_to).map(u32::from).collect())
            .collect();
        if self.drop_last {
            ids.pop();
        }
        Ok(ids)
    }
}

// Upper-cases the decoded prompt back at the caller
#[derive(Debug, Default)]
pub struct MockModel {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    drop_last: bool,
    batch_sizes: Mutex<Vec<usize>>,
    params: Mutex<Vec<GenerationConfig>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the `call`th generate call, counting from 1.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Returns one output fewer than the batch has items.
    pub fn dropping_last_output(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub fn params(&self) -> Vec<GenerationConfig> {
        self.params.lock().unwrap().clone()
    }
}

#[async_trait]
impl Inference for MockModel {
    type Error = String;

    async fn generate(&self, batch: &Batch, params: &GenerationConfig) -> Result<Vec<String>, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.batch_sizes.lock().unwrap().push(batch.item_count());
        self.params.lock().unwrap().push(*params);

        if self.fail_on_call == Some(call) {
            return Err(format!("device lost on call {call}"));
        }

        let mut outputs: Vec<String> = batch
            .iter()
            .map(|sequence| {
                sequence
                    .ids()
                    .iter()
                    .filter_map(|&id| char::from_u32(id))
                    .collect::<String>()
                    .to_uppercase()
            })
            .collect();
        if self.drop_last {
            outputs.pop();
        }
        Ok(outputs)
    }
}
