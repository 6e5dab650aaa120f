use std::str::FromStr;
use std::sync::Arc;
use fc_core::{AnalysisProvider, Error, Result};
use tracing::info;

use crate::analysis::{HeuristicAnalyzer, LanguageModelAnalyzer};
use crate::Config;

pub mod dummy;
pub mod openai;

#[cfg(feature = "ollama")]
pub mod langchain;

pub use fc_core::InferenceModel;
pub use dummy::DummyModel;
pub use openai::OpenAIModel;

#[cfg(feature = "ollama")]
pub use langchain::LangChainModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    OpenAI,
    Ollama,
    Dummy,
    /// No language model at all; only the keyword heuristic.
    Heuristic,
}

impl Default for ModelKind {
    fn default() -> Self {
        Self::OpenAI
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "dummy" => Ok(Self::Dummy),
            "heuristic" | "none" => Ok(Self::Heuristic),
            other => Err(Error::Inference(format!(
                "Unknown model '{}'. Available models: openai, ollama, dummy, heuristic",
                other
            ))),
        }
    }
}

impl ModelKind {
    fn from_config(config: &Config) -> Result<Self> {
        config
            .model_name
            .as_deref()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Build the language model selected by `config`.
pub fn create_model(config: &Config) -> Result<Arc<dyn InferenceModel>> {
    match ModelKind::from_config(config)? {
        ModelKind::OpenAI => Ok(Arc::new(OpenAIModel::new(config)?)),
        #[cfg(feature = "ollama")]
        ModelKind::Ollama => Ok(Arc::new(langchain::LangChainModel::new(config)?)),
        #[cfg(not(feature = "ollama"))]
        ModelKind::Ollama => Err(Error::Inference(
            "Ollama support was not compiled in (enable the `ollama` feature)".to_string(),
        )),
        ModelKind::Dummy => Ok(Arc::new(DummyModel::new())),
        ModelKind::Heuristic => Err(Error::Inference(
            "The heuristic analyzer does not use a language model".to_string(),
        )),
    }
}

/// Build the analysis provider for `config`, wrapping the model in the fallback policy.
pub fn create_analyzer(config: &Config) -> Result<Arc<dyn AnalysisProvider>> {
    let analyzer: Arc<dyn AnalysisProvider> = match ModelKind::from_config(config)? {
        ModelKind::Heuristic => Arc::new(HeuristicAnalyzer),
        _ => Arc::new(LanguageModelAnalyzer::new(create_model(config)?, config.analysis_timeout)),
    };
    info!("🧠 Analysis provider ready (using {})", analyzer.name());
    Ok(analyzer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> Config {
        Config {
            model_name: Some(model.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("OpenAI".parse::<ModelKind>().unwrap(), ModelKind::OpenAI);
        assert_eq!("heuristic".parse::<ModelKind>().unwrap(), ModelKind::Heuristic);
        assert!("gpt-5".parse::<ModelKind>().is_err());
        assert_eq!(ModelKind::from_config(&Config::default()).unwrap(), ModelKind::OpenAI);
    }

    #[test]
    fn test_create_model() {
        assert_eq!(create_model(&config("dummy")).unwrap().name(), "Dummy");
        assert!(create_model(&config("openai")).is_err());
        assert!(create_model(&config("heuristic")).is_err());

        let with_key = Config {
            api_key: Some("sk-test".to_string()),
            ..config("openai")
        };
        assert_eq!(create_model(&with_key).unwrap().name(), "OpenAI");
    }

    #[test]
    fn test_create_analyzer() {
        assert_eq!(create_analyzer(&config("heuristic")).unwrap().name(), "Heuristic");
        assert_eq!(create_analyzer(&config("dummy")).unwrap().name(), "Dummy");
        assert!(create_analyzer(&config("unknown")).is_err());
    }
}
