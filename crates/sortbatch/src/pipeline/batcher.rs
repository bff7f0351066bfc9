use futures::{StreamExt, TryStreamExt};
use futures::stream::try_unfold;
use crate::collaborator::{Inference, Tokenizer};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::sequence::SequenceStore;
use crate::stream::BatchStream;
use super::output_stream::{BatchOutput, OutputStream};

/// The error type of a pipeline built from tokenizer `T` and model `M`.
pub type RunError<T, M> = PipelineError<<T as Tokenizer>::Error, <M as Inference>::Error>;

/// Progress of one [`SortedBatchInference::run`] call.
enum RunState {
    /// Not yet polled; the prompts are untouched
    Pending(Vec<String>),

    /// Tokenized and bucketed; one batch per poll
    Streaming(BatchStream),
}

/// Runs prompts through a tokenizer, length-sorted batching, and a model.
///
/// Prompts are tokenized, grouped by exact token length, packed under the configured
/// [`BatchPolicy`](crate::packer::BatchPolicy), and sent to the model one batch at a time.
/// Outputs carry the input position they belong to, so results can be returned in prompt
/// order even though batches run shortest-first.
///
/// # Type Parameters
///
/// * `T` - The tokenizer collaborator
/// * `M` - The inference collaborator
///
/// # Example
///
/// ```rust
/// # use std::convert::Infallible;
/// use async_trait::async_trait;
/// use sortbatch::{Batch, BatchPolicy, PipelineConfig, SortedBatchInference};
/// use sortbatch::collaborator::{Inference, Tokenizer};
/// use sortbatch::config::{GenerationConfig, TokenizeConfig};
///
/// struct Words;
///
/// impl Tokenizer for Words {
///     type Error = Infallible;
///
///     fn tokenize(&self, prompts: &[String], config: &TokenizeConfig) -> Result<Vec<Vec<u32>>, Infallible> {
///         Ok(prompts
///             .iter()
///             .map(|p| p.split_whitespace().take(config.truncate_to).map(|w| w.len() as u32).collect())
///             .collect())
///     }
/// }
///
/// struct Count;
///
/// #[async_trait]
/// impl Inference for Count {
///     type Error = Infallible;
///
///     async fn generate(&self, batch: &Batch, _: &GenerationConfig) -> Result<Vec<String>, Infallible> {
///         Ok(batch.iter().map(|s| format!("{} words", s.len())).collect())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let pipeline = SortedBatchInference::new(Words, Count, PipelineConfig::with_policy(BatchPolicy::token_budget(4)));
///
/// let outputs = pipeline
///     .generate_all(["a b c", "", "d e"])
///     .await
///     .unwrap();
///
/// assert_eq!(outputs, vec![Some("3 words".to_string()), None, Some("2 words".to_string())]);
/// # }
/// ```
pub struct SortedBatchInference<T, M> {
    tokenizer: T,
    model: M,
    config: PipelineConfig,
}

impl<T, M> SortedBatchInference<T, M>
where T: Tokenizer, M: Inference
{
    /// Creates a pipeline. The configuration is validated when a run is first polled.
    pub fn new(tokenizer: T, model: M, config: PipelineConfig) -> Self {
        Self {
            tokenizer,
            model,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Starts a run over `prompts` and returns its per-batch results.
    ///
    /// No work happens until the stream is polled. The first poll validates the
    /// configuration, so an invalid policy fails before the tokenizer is invoked; it then
    /// tokenizes every prompt and yields the first batch. Each later poll packs one more
    /// batch and awaits the model on it.
    ///
    /// Collaborator errors are yielded as they occur and end the stream. Batches already
    /// yielded stay valid.
    ///
    /// # Parameters
    ///
    /// * `prompts` - Raw input strings; results refer to them by position
    ///
    /// # Returns
    ///
    /// An [`OutputStream`] yielding one [`BatchOutput`] per batch, shortest lengths first
    pub fn run<P>(&self, prompts: P) -> OutputStream<'_, RunError<T, M>>
    where P: IntoIterator, P::Item: Into<String>
    {
        let prompts: Vec<String> = prompts.into_iter().map(Into::into).collect();
        let stream = try_unfold(RunState::Pending(prompts), move |state| self.step(state));
        OutputStream::new(stream.boxed())
    }

    /// Runs every prompt to completion.
    ///
    /// # Returns
    ///
    /// One entry per prompt, in prompt order: the model's output, or `None` for a prompt
    /// that tokenized to nothing and was never batched
    pub async fn generate_all<P>(&self, prompts: P) -> Result<Vec<Option<String>>, RunError<T, M>>
    where P: IntoIterator, P::Item: Into<String>
    {
        let prompts: Vec<String> = prompts.into_iter().map(Into::into).collect();
        let mut results = vec![None; prompts.len()];

        let mut outputs = self.run(prompts);
        while let Some(batch_output) = outputs.try_next().await? {
            for (index, output) in batch_output {
                if let Some(slot) = results.get_mut(index) {
                    *slot = Some(output);
                }
            }
        }
        Ok(results)
    }

    /// Advances a run by one batch.
    async fn step(&self, state: RunState) -> Result<Option<(BatchOutput, RunState)>, RunError<T, M>> {
        let mut batches = match state {
            RunState::Pending(prompts) => self.plan(prompts)?,
            RunState::Streaming(batches) => batches,
        };

        let Some(batch) = batches.next().transpose()? else {
            return Ok(None);
        };

        let outputs = self
            .model
            .generate(&batch, &self.config.generation)
            .await
            .map_err(PipelineError::Inference)?;

        if outputs.len() != batch.item_count() {
            return Err(PipelineError::CountMismatch {
                stage: "inference",
                expected: batch.item_count(),
                actual: outputs.len(),
            });
        }

        tracing::debug!(
            plan = %batches.plan_id(),
            items = batch.item_count(),
            tokens = batch.token_count(),
            "batch generated"
        );
        Ok(Some((BatchOutput::new(batch.indices(), outputs), RunState::Streaming(batches))))
    }

    /// Validates the configuration, tokenizes `prompts`, and prepares their batch stream.
    fn plan(&self, prompts: Vec<String>) -> Result<BatchStream, RunError<T, M>> {
        self.config.validate()?;

        let token_ids = self
            .tokenizer
            .tokenize(&prompts, &self.config.tokenize)
            .map_err(PipelineError::Tokenizer)?;

        if token_ids.len() != prompts.len() {
            return Err(PipelineError::CountMismatch {
                stage: "tokenizer",
                expected: prompts.len(),
                actual: token_ids.len(),
            });
        }

        let store = SequenceStore::from_token_ids(token_ids);
        let (non_empty, longest) = (store.non_empty_count(), store.max_length());
        let batches = BatchStream::new(store, self.config.policy);
        tracing::debug!(
            plan = %batches.plan_id(),
            prompts = prompts.len(),
            non_empty,
            longest = ?longest,
            "prompts tokenized"
        );
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockModel, MockTokenizer};
    use crate::config::GenerationConfig;
    use crate::error::BatchError;
    use crate::packer::BatchPolicy;
    use tracing_test::traced_test;

    fn pipeline(policy: BatchPolicy) -> SortedBatchInference<MockTokenizer, MockModel> {
        SortedBatchInference::new(MockTokenizer::new(), MockModel::new(), PipelineConfig::with_policy(policy))
    }

    #[tokio::test]
    async fn test_empty_prompt_is_dropped() {
        let pipeline = pipeline(BatchPolicy::default());
        let outputs = pipeline.generate_all(["", "ab"]).await.unwrap();
        assert_eq!(outputs, vec![None, Some("AB".to_string())]);
        assert_eq!(pipeline.model().batch_sizes(), vec![1]);
    }

    #[tokio::test]
    async fn test_outputs_return_in_prompt_order() {
        let pipeline = pipeline(BatchPolicy::token_budget(2));
        let outputs = pipeline.generate_all(["ccc", "a", "bb", "dd", "e"]).await.unwrap();
        let outputs: Vec<String> = outputs.into_iter().flatten().collect();
        assert_eq!(outputs, vec!["CCC", "A", "BB", "DD", "E"]);
        assert_eq!(pipeline.model().batch_sizes(), vec![2, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_run_yields_shortest_batches_first() {
        let pipeline = pipeline(BatchPolicy::fixed_count(4));
        let batches: Vec<BatchOutput> = pipeline
            .run(["xyz", "p", "q"])
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].indices(), &[1, 2]);
        assert_eq!(batches[0].outputs(), &["P".to_string(), "Q".to_string()]);
        assert_eq!(batches[1].indices(), &[0]);
    }

    #[tokio::test]
    async fn test_invalid_policy_fails_before_tokenizing() {
        let pipeline = pipeline(BatchPolicy::token_budget(0));
        let mut outputs = pipeline.run(["a", "b"]);
        let first = outputs.next().await.unwrap();
        assert!(matches!(first, Err(PipelineError::Batching(BatchError::InvalidConfiguration(_)))));
        assert!(outputs.next().await.is_none());
        assert_eq!(pipeline.tokenizer().calls(), 0);
        assert_eq!(pipeline.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_run_is_lazy() {
        let pipeline = pipeline(BatchPolicy::default());
        let outputs = pipeline.run(["a", "b"]);
        assert_eq!(pipeline.tokenizer().calls(), 0);
        drop(outputs);
        assert_eq!(pipeline.tokenizer().calls(), 0);
    }

    #[tokio::test]
    async fn test_tokenizer_error_is_surfaced_unchanged() {
        let pipeline = SortedBatchInference::new(MockTokenizer::failing(), MockModel::new(), PipelineConfig::default());
        let err = pipeline.generate_all(["a"]).await.unwrap_err();
        match err {
            PipelineError::Tokenizer(message) => assert_eq!(message, "tokenizer offline"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(pipeline.model().calls(), 0);
    }

    #[tokio::test]
    async fn test_inference_error_ends_stream_after_good_batches() {
        let pipeline = SortedBatchInference::new(
            MockTokenizer::new(),
            MockModel::new().failing_on(2),
            PipelineConfig::with_policy(BatchPolicy::fixed_count(1)),
        );
        let results: Vec<_> = pipeline.run(["a", "b", "c"]).collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(PipelineError::Inference(message)) => assert_eq!(message, "device lost on call 2"),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(pipeline.model().calls(), 2);
    }

    #[tokio::test]
    async fn test_short_model_output_is_a_count_mismatch() {
        let pipeline = SortedBatchInference::new(
            MockTokenizer::new(),
            MockModel::new().dropping_last_output(),
            PipelineConfig::with_policy(BatchPolicy::fixed_count(3)),
        );
        let err = pipeline.generate_all(["a", "b", "c"]).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CountMismatch { stage: "inference", expected: 3, actual: 2 }
        ));
    }

    #[tokio::test]
    async fn test_short_tokenizer_output_is_a_count_mismatch() {
        let pipeline = SortedBatchInference::new(
            MockTokenizer::new().dropping_last_prompt(),
            MockModel::new(),
            PipelineConfig::default(),
        );
        let err = pipeline.generate_all(["a", "b"]).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CountMismatch { stage: "tokenizer", expected: 2, actual: 1 }
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_consumer_can_stop_after_one_batch() {
        let pipeline = pipeline(BatchPolicy::fixed_count(1));
        let mut outputs = pipeline.run(["a", "b", "c"]).timed("partial run");
        assert!(outputs.next().await.unwrap().is_ok());
        assert!(!logs_contain("execution time"));

        drop(outputs);
        assert_eq!(pipeline.model().calls(), 1);
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("execution time label=partial run")).count() {
                1 => Ok(()),
                n => Err(format!("expected one report, found {n}")),
            }
        });
    }

    #[tokio::test]
    async fn test_generation_parameters_pass_through() {
        let mut config = PipelineConfig::default();
        config.generation = GenerationConfig {
            max_output_length: 32,
            beam_width: 4,
            repetition_penalty: 1.2,
        };
        let pipeline = SortedBatchInference::new(MockTokenizer::new(), MockModel::new(), config);
        pipeline.generate_all(["a", "bb"]).await.unwrap();
        assert!(pipeline.model().params().iter().all(|p| *p == config.generation));
        assert_eq!(pipeline.model().params().len(), 2);
    }

    #[tokio::test]
    async fn test_truncation_is_applied_by_the_tokenizer() {
        let mut config = PipelineConfig::default();
        config.tokenize.truncate_to = 2;
        let pipeline = SortedBatchInference::new(MockTokenizer::new(), MockModel::new(), config);
        let outputs = pipeline.generate_all(["abcdef"]).await.unwrap();
        assert_eq!(outputs, vec![Some("AB".to_string())]);
    }

    #[tokio::test]
    async fn test_no_prompts_yields_nothing() {
        let pipeline = pipeline(BatchPolicy::default());
        let outputs = pipeline.generate_all(Vec::<String>::new()).await.unwrap();
        assert!(outputs.is_empty());
        assert_eq!(pipeline.tokenizer().calls(), 1);
        assert_eq!(pipeline.model().calls(), 0);
    }
}
