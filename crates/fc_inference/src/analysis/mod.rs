use async_trait::async_trait;
use fc_core::{AnalysisInput, AnalysisProvider, Error, InferenceModel, Verdict};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::heuristic::heuristic_verdict;

pub mod prompt;

pub use prompt::{build_prompt, parse_verdict};

/// Asks a language model for a verdict and falls back when it cannot give one.
///
/// A reply that does not parse becomes [`Verdict::parsing_error`]. A model that
/// errors or does not answer within the timeout is replaced by the keyword
/// heuristic.
pub struct LanguageModelAnalyzer {
    model: Arc<dyn InferenceModel>,
    timeout: Duration,
}

impl fmt::Debug for LanguageModelAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageModelAnalyzer")
            .field("model", &self.model.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LanguageModelAnalyzer {
    pub fn new(model: Arc<dyn InferenceModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    async fn generate(&self, prompt: &str) -> fc_core::Result<String> {
        match tokio::time::timeout(self.timeout, self.model.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ExternalService(format!(
                "{} did not answer within {:?}",
                self.model.name(),
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl AnalysisProvider for LanguageModelAnalyzer {
    fn name(&self) -> &str {
        self.model.name()
    }

    async fn analyze(&self, input: &AnalysisInput) -> Verdict {
        let prompt = build_prompt(input);
        let reply = match self.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("🧠 {} failed, using heuristic analysis: {}", self.model.name(), e);
                return heuristic_verdict(input);
            }
        };

        match parse_verdict(&reply) {
            Ok(verdict) => {
                debug!("🧠 {} answered {} ({:.2})", self.model.name(), verdict.label, verdict.confidence);
                verdict
            }
            Err(e) => {
                warn!(raw_output = %reply, "🧠 Failed to parse {} output: {}", self.model.name(), e);
                Verdict::parsing_error()
            }
        }
    }
}

/// Keyword heuristic only, for deployments without a language model.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicAnalyzer;

#[async_trait]
impl AnalysisProvider for HeuristicAnalyzer {
    fn name(&self) -> &str {
        "Heuristic"
    }

    async fn analyze(&self, input: &AnalysisInput) -> Verdict {
        heuristic_verdict(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dummy::DummyModel;
    use fc_core::Label;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    enum Behaviour {
        Fail,
        Hang,
    }

    #[derive(Debug)]
    struct BrokenModel {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl BrokenModel {
        fn new(behaviour: Behaviour) -> Self {
            Self { behaviour, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl InferenceModel for BrokenModel {
        fn name(&self) -> &str {
            "Broken"
        }

        async fn generate(&self, _prompt: &str) -> fc_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Fail => Err(Error::ExternalService("401 Unauthorized".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("{}".to_string())
                }
            }
        }
    }

    fn reliable_input() -> AnalysisInput {
        AnalysisInput {
            title: "Council approves budget".to_string(),
            content: "The council approved the budget.".to_string(),
            url: Some("https://news.example.com/budget".to_string()),
            domain: Some("news.example.com".to_string()),
            reliability_score: 0.9,
        }
    }

    #[tokio::test]
    async fn test_model_reply_is_used() {
        let model = Arc::new(DummyModel::with_response(
            r#"{"label": "Likely False", "confidence": 0.91, "explanation": "Fabricated quote.", "sentiment": "negative", "evidenceLinks": ["https://example.org/debunk"]}"#,
        ));
        let analyzer = LanguageModelAnalyzer::new(model, Duration::from_secs(1));

        let verdict = analyzer.analyze(&reliable_input()).await;
        assert_eq!(verdict.label, Label::LikelyFalse);
        assert_eq!(verdict.confidence, 0.91);
        assert_eq!(verdict.evidence_links, vec!["https://example.org/debunk".to_string()]);
    }

    #[tokio::test]
    async fn test_unparseable_reply_gives_parsing_error_verdict() {
        let model = Arc::new(DummyModel::with_response("Sorry, I cannot help with that."));
        let analyzer = LanguageModelAnalyzer::new(model, Duration::from_secs(1));

        let verdict = analyzer.analyze(&reliable_input()).await;
        assert_eq!(
            verdict,
            Verdict {
                label: Label::Uncertain,
                confidence: 0.5,
                explanation: "Parsing error".to_string(),
                evidence_links: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_heuristic() {
        let model = Arc::new(BrokenModel::new(Behaviour::Fail));
        let analyzer = LanguageModelAnalyzer::new(model.clone(), Duration::from_secs(1));

        let verdict = analyzer.analyze(&reliable_input()).await;
        assert_eq!(verdict, heuristic_verdict(&reliable_input()));
        assert_eq!(verdict.label, Label::LikelyTrue);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_heuristic() {
        let model = Arc::new(BrokenModel::new(Behaviour::Hang));
        let analyzer = LanguageModelAnalyzer::new(model, Duration::from_millis(20));

        let started = std::time::Instant::now();
        let verdict = analyzer.analyze(&reliable_input()).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(verdict.label, Label::LikelyTrue);
        assert_eq!(verdict.confidence, 0.75);
    }

    #[tokio::test]
    async fn test_heuristic_analyzer() {
        let analyzer = HeuristicAnalyzer;
        let mut input = reliable_input();
        input.reliability_score = 0.2;

        let verdict = analyzer.analyze(&input).await;
        assert_eq!(verdict.label, Label::LikelyFalse);
        assert!(verdict.is_well_formed());
    }
}
