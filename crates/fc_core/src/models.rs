use async_trait::async_trait;
use std::fmt;
use crate::types::{AnalysisInput, Verdict};
use crate::Result;

/// A text-generation backend (hosted or local language model).
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Complete `prompt` with deterministic sampling and return the raw reply.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Produces a verdict for an article.
///
/// Implementations never fail: when the underlying model is unreachable or
/// answers nonsense they degrade to a fallback verdict instead.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, input: &AnalysisInput) -> Verdict;
}
