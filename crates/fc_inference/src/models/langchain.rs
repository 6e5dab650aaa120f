use std::sync::Arc;
use std::fmt;
use fc_core::Result;
use super::InferenceModel;
use crate::{Config, ModelConfig};
use anyhow::anyhow;
use url::Url;

use langchain_rust::llm::ollama::client::{Ollama, OllamaClient};
use langchain_rust::llm::client::GenerationOptions;
use langchain_rust::language_models::llm::LLM;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/gemma3:12b";

#[derive(Debug)]
pub struct LangChainModelConfig {
    ollama_host: String,
    ollama_port: u16,
    model_name: String,
}

impl Default for LangChainModelConfig {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost".to_string(),
            ollama_port: 11434,
            model_name: "gemma3:12b".to_string(),
        }
    }
}

impl ModelConfig for LangChainModelConfig {
    fn from_inference_config(config: &Config) -> Self {
        let defaults = Self::default();
        let url = config.model_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
        let Ok(parsed_url) = Url::parse(url) else {
            return defaults;
        };

        let model_name = config
            .model_id
            .clone()
            .unwrap_or_else(|| parsed_url.path().trim_start_matches('/').to_string());

        Self {
            ollama_host: format!("{}://{}", parsed_url.scheme(), parsed_url.host_str().unwrap_or("localhost")),
            ollama_port: parsed_url.port().unwrap_or(defaults.ollama_port),
            model_name: if model_name.is_empty() { defaults.model_name } else { model_name },
        }
    }
}

/// A local model served by Ollama.
pub struct LangChainModel {
    ollama: Ollama,
}

impl fmt::Debug for LangChainModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LangChainModel")
            .field("ollama_client", &"<Ollama>")
            .finish()
    }
}

impl LangChainModel {
    pub fn new(config: &Config) -> Result<Self> {
        let model_config = LangChainModelConfig::from_inference_config(config);
        let client = Arc::new(OllamaClient::new(
            model_config.ollama_host.clone(),
            model_config.ollama_port,
        ));
        let ollama = Ollama::new(
            client,
            model_config.model_name.clone(),
            Some(GenerationOptions::default().temperature(0.0)),
        );
        tracing::info!(
            "Using Ollama model '{}' at {}:{}",
            model_config.model_name, model_config.ollama_host, model_config.ollama_port
        );
        Ok(Self { ollama })
    }
}

#[async_trait::async_trait]
impl InferenceModel for LangChainModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.ollama
            .invoke(prompt)
            .await
            .map_err(|e| fc_core::Error::External(anyhow!("Ollama generation failed: {}", e)))
    }
}
