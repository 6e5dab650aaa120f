use std::sync::Arc;
use futures::future::try_join_all;
use fc_core::{
    CommunityPost, Error, Feedback, FeedbackTally, NewFeedback, Prediction, RecordId, Result, Storage,
};
use tracing::info;
use crate::predictions::populate;

/// Reader feedback on predictions and the community listing built from it.
#[derive(Clone)]
pub struct FeedbackService {
    storage: Arc<dyn Storage>,
}

impl FeedbackService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn submit_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        let feedback = feedback.normalize()?;
        if self.storage.get_prediction(&feedback.prediction_id).await?.is_none() {
            return Err(Error::NotFound("Prediction".to_string()));
        }
        if let Some(user_id) = &feedback.user_id {
            if self.storage.get_user(user_id).await?.is_none() {
                return Err(Error::NotFound("User".to_string()));
            }
        }

        let feedback = self.storage.insert_feedback(feedback).await?;
        info!(
            "💬 Recorded {} feedback {} on prediction {}",
            feedback.rating, feedback.id, feedback.prediction_id
        );
        Ok(feedback)
    }

    /// Feedback on one prediction, oldest first.
    pub async fn feedback_for_prediction(&self, prediction_id: &str) -> Result<Vec<Feedback>> {
        let not_found = || Error::NotFound("Prediction".to_string());
        let prediction_id = RecordId::parse(prediction_id).map_err(|_| not_found())?;
        if self.storage.get_prediction(&prediction_id).await?.is_none() {
            return Err(not_found());
        }
        self.storage.list_feedback(&prediction_id).await
    }

    /// Every prediction, newest first, with its article, feedback tally and comments.
    pub async fn community_posts(&self) -> Result<Vec<CommunityPost>> {
        let predictions = self.storage.list_predictions().await?;
        try_join_all(predictions.into_iter().map(|prediction| self.community_post(prediction))).await
    }

    async fn community_post(&self, prediction: Prediction) -> Result<CommunityPost> {
        let feedback = self.storage.list_feedback(&prediction.id).await?;
        let tally: FeedbackTally = feedback.iter().collect();
        let comments = feedback.into_iter().filter(|f| f.comment.is_some()).collect();
        let prediction = populate(self.storage.as_ref(), prediction, false).await?;
        Ok(CommunityPost { prediction, tally, comments })
    }
}
