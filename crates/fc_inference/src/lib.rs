use std::time::Duration;

pub mod analysis;
pub mod heuristic;
pub mod models;

pub use analysis::{HeuristicAnalyzer, LanguageModelAnalyzer};
pub use models::{create_analyzer, create_model, ModelKind};

pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Config {
    /// Which backend to use (`openai`, `ollama`, `dummy` or `heuristic`)
    pub model_name: Option<String>,
    /// Model identifier passed to the backend, e.g. `gpt-4o-mini`
    pub model_id: Option<String>,
    pub model_url: Option<String>,
    pub api_key: Option<String>,
    pub analysis_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("model_name", &self.model_name)
            .field("model_id", &self.model_id)
            .field("model_url", &self.model_url)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("analysis_timeout", &self.analysis_timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: None,
            model_id: None,
            model_url: None,
            api_key: None,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }
}

/// Backend-specific settings derived from the shared [`Config`].
pub trait ModelConfig {
    fn from_inference_config(config: &Config) -> Self;
}

pub mod prelude {
    pub use super::{Config, ModelConfig};
    pub use super::models::{create_analyzer, create_model};
    pub use fc_core::{AnalysisInput, AnalysisProvider, Error, InferenceModel, Label, Result, Verdict};
}
