use std::fmt;
use fc_core::Result;
use super::InferenceModel;

const DEFAULT_RESPONSE: &str = r#"{"label": "Uncertain", "confidence": 0.5, "explanation": "No language model is configured; this is a canned verdict.", "sentiment": "neutral", "evidenceLinks": []}"#;

/// Replies with the same canned text to every prompt.
pub struct DummyModel {
    response: String,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::with_response(DEFAULT_RESPONSE)
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}
