mod model;

use futures::stream::StreamExt;
use rand::{thread_rng, Rng};
use rand::seq::SliceRandom;
use sortbatch::{BatchPolicy, PipelineConfig, SortedBatchInference};
use sortbatch::timing::timed_async;
use tracing_subscriber::EnvFilter;
use crate::model::{ChecksumModel, WordTokenizer};

const WORDS: &[&str] = &[
    "translate", "the", "following", "sentence", "into", "french", "model", "batch",
    "sorted", "length", "token", "quickly", "please", "summarize", "this", "paragraph",
];

fn sample_prompts(count: usize) -> Vec<String> {
    let mut rng = thread_rng();
    (0..count)
        .map(|_| {
            let len = rng.gen_range(0..=12);
            (0..len)
                .filter_map(|_| WORDS.choose(&mut rng).copied())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn load_config() -> PipelineConfig {
    let Some(path) = std::env::args().nth(1) else {
        return PipelineConfig::default();
    };
    match std::fs::read_to_string(&path).map(|raw| serde_json::from_str(&raw)) {
        Ok(Ok(config)) => config,
        Ok(Err(e)) => {
            tracing::warn!(%path, error = %e, "invalid config, using defaults");
            PipelineConfig::default()
        }
        Err(e) => {
            tracing::warn!(%path, error = %e, "unreadable config, using defaults");
            PipelineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let prompts = sample_prompts(100);
    let config = load_config();

    let bi = SortedBatchInference::new(WordTokenizer::new(32_000), ChecksumModel::new(), config);
    let (outputs, _) = timed_async("generate all", bi.generate_all(prompts.clone())).await;
    match outputs {
        Ok(outputs) => {
            for (index, output) in outputs.iter().enumerate().take(5) {
                println!("Index {} output {:?}", index, output);
            }
        }
        Err(e) => println!("Err running pipeline: {}", e),
    }

    let bi = SortedBatchInference::new(
        WordTokenizer::new(32_000),
        ChecksumModel::new(),
        PipelineConfig {
            policy: BatchPolicy::fixed_count(4),
            ..config
        },
    );
    let mut it = bi.run(prompts).timed("fixed count stream");
    while let Some(batch) = it.next().await {
        match batch {
            Ok(batch) => println!("Batch of {} for inputs {:?}", batch.len(), batch.indices()),
            Err(e) => {
                println!("Err in batch: {}", e);
                break;
            }
        }
    }
}
