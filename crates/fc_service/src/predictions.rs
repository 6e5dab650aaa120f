use std::fmt;
use std::sync::Arc;
use futures::future::try_join_all;
use fc_core::{
    AnalysisInput, AnalysisProvider, Error, PopulatedArticle, PopulatedPrediction, Prediction,
    RecordId, Result, Storage, Verdict,
};
use crate::logging::Logger;

/// Whether a prediction was produced by this call or found already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Existing,
}

/// Creates at most one prediction per article and serves them back.
#[derive(Clone)]
pub struct PredictionService {
    storage: Arc<dyn Storage>,
    analyzer: Arc<dyn AnalysisProvider>,
}

impl fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionService")
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl PredictionService {
    pub fn new(storage: Arc<dyn Storage>, analyzer: Arc<dyn AnalysisProvider>) -> Self {
        Self { storage, analyzer }
    }

    /// Return the article's prediction, analysing the article first if it has none.
    pub async fn get_or_create_prediction(&self, article_id: &str) -> Result<(Prediction, Outcome)> {
        let article_id = RecordId::parse(article_id)?;
        let logger = Logger::new().with_prefix(format!("[article {}]", article_id));

        let article = self
            .storage
            .get_article(&article_id)
            .await?
            .ok_or_else(|| Error::NotFound("Article".to_string()))?;

        if let Some(existing) = self.storage.get_prediction_by_article(&article.id).await? {
            logger.debug("Prediction already exists");
            return Ok((existing, Outcome::Existing));
        }

        logger.info(&format!("🤖 Analysing with {}", self.analyzer.name()));
        let verdict = self.analyzer.analyze(&AnalysisInput::from(&article)).await;
        let verdict = if verdict.is_well_formed() {
            verdict
        } else {
            logger.warn(&format!("Discarding ill-formed verdict: {:?}", verdict));
            Verdict::parsing_error()
        };

        let prediction = Prediction::from_verdict(article.id, verdict);
        match self.storage.insert_prediction(&prediction).await {
            Ok(()) => {}
            Err(Error::DuplicateKey(_)) => {
                logger.info("Another request stored a prediction first, returning it");
                return match self.storage.get_prediction_by_article(&article.id).await? {
                    Some(existing) => Ok((existing, Outcome::Existing)),
                    None => {
                        let message = format!(
                            "prediction for article {} conflicted but could not be read back",
                            article.id
                        );
                        logger.error(&message);
                        Err(Error::Storage(message))
                    }
                };
            }
            Err(e) => {
                logger.error(&format!("Failed to store prediction: {}", e));
                return Err(e);
            }
        }
        logger.info(&format!(
            "✨ Stored prediction {} ({}, {:.2})",
            prediction.id, prediction.label, prediction.confidence
        ));

        if let Some(user_id) = article.submitted_by {
            match self.storage.append_history(&user_id, &prediction.id).await {
                Ok(true) => {}
                Ok(false) => logger.warn(&format!("Submitter {} no longer exists, history not updated", user_id)),
                Err(e) => logger.warn(&format!("Failed to update history of {}: {}", user_id, e)),
            }
        }

        Ok((prediction, Outcome::Created))
    }

    /// All predictions, newest first, each with its article.
    pub async fn list_predictions(&self) -> Result<Vec<PopulatedPrediction>> {
        let predictions = self.storage.list_predictions().await?;
        try_join_all(
            predictions
                .into_iter()
                .map(|prediction| populate(self.storage.as_ref(), prediction, false)),
        )
        .await
    }

    /// One prediction with its article and the article's submitter.
    pub async fn get_prediction(&self, id: &str) -> Result<PopulatedPrediction> {
        let not_found = || Error::NotFound("Prediction".to_string());
        let id = RecordId::parse(id).map_err(|_| not_found())?;
        let prediction = self.storage.get_prediction(&id).await?.ok_or_else(not_found)?;
        populate(self.storage.as_ref(), prediction, true).await
    }

    pub async fn get_prediction_for_article(&self, article_id: &str) -> Result<PopulatedPrediction> {
        let not_found = || Error::NotFound("Prediction for this article".to_string());
        let article_id = RecordId::parse(article_id).map_err(|_| not_found())?;
        let prediction = self
            .storage
            .get_prediction_by_article(&article_id)
            .await?
            .ok_or_else(not_found)?;
        populate(self.storage.as_ref(), prediction, true).await
    }
}

/// Attach the prediction's article, and optionally the article's submitter.
pub(crate) async fn populate(
    storage: &dyn Storage,
    prediction: Prediction,
    with_submitter: bool,
) -> Result<PopulatedPrediction> {
    let article = match storage.get_article(&prediction.article_id).await? {
        Some(article) => {
            let submitter = match (with_submitter, article.submitted_by) {
                (true, Some(user_id)) => storage.get_user(&user_id).await?.map(|u| u.summary()),
                _ => None,
            };
            Some(PopulatedArticle { article, submitter })
        }
        None => {
            tracing::warn!(
                "Prediction {} references missing article {}",
                prediction.id, prediction.article_id
            );
            None
        }
    };
    Ok(PopulatedPrediction { prediction, article })
}
