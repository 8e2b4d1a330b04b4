use async_trait::async_trait;
use awful_aj::{api::ask, config::AwfulJadeConfig, template::ChatTemplate};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),
}

/// The external classification service. Implementations return the raw
/// response body; validation happens in `normalize`.
/// Requests are awaited on the controller's task, so futures need not be Send.
#[async_trait(?Send)]
pub trait ModelService {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// OpenAI-compatible endpoint reached through awful_aj.
pub struct AwfulJadeService {
    cfg: AwfulJadeConfig,
    tpl: ChatTemplate,
}

impl AwfulJadeService {
    pub fn new(cfg: AwfulJadeConfig, tpl: ChatTemplate) -> Self {
        Self { cfg, tpl }
    }
}

#[async_trait(?Send)]
impl ModelService for AwfulJadeService {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let start = std::time::Instant::now();

        debug!("LLM call starting - prompt_length={} chars", prompt.len());

        let answer = ask(&self.cfg, prompt.to_string(), &self.tpl, None, None, false)
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let elapsed = start.elapsed();
        info!(
            "LLM API call completed - duration={:.2}s, response_length={} chars",
            elapsed.as_secs_f32(),
            answer.len()
        );

        Ok(answer)
    }
}
