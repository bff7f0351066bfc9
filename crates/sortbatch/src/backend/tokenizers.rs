use crate::collaborator::Tokenizer;
use crate::config::TokenizeConfig;

impl Tokenizer for tokenizers::Tokenizer {
    type Error = tokenizers::Error;

    /// Encodes every prompt in one call, then truncates each to `config.truncate_to` ids.
    ///
    /// Special tokens are added unless `config.drop_special_tokens` is set. Padding
    /// configured on the tokenizer is stripped: only ids with a set attention mask are
    /// kept, so an empty prompt stays empty and lengths are not levelled.
    fn tokenize(&self, prompts: &[String], config: &TokenizeConfig) -> Result<Vec<Vec<u32>>, Self::Error> {
        let encodings = self.encode_batch(prompts.to_vec(), !config.drop_special_tokens)?;
        Ok(encodings
            .iter()
            .map(|encoding| {
                encoding
                    .get_ids()
                    .iter()
                    .zip(encoding.get_attention_mask())
                    .filter(|&(_, &mask)| mask == 1)
                    .map(|(&id, _)| id)
                    .take(config.truncate_to)
                    .collect()
            })
            .collect())
    }
}
