use std::sync::Arc;
use futures::future::try_join_all;
use fc_core::{Error, NewUser, PopulatedPrediction, RecordId, Result, Storage, User};
use crate::predictions::populate;

#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn Storage>,
}

impl UserService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn register_user(&self, user: NewUser) -> Result<User> {
        let user = user.normalize()?;
        let email = user.email.clone();
        let user = match self.storage.insert_user(user).await {
            Ok(user) => user,
            Err(Error::DuplicateKey(_)) => {
                return Err(Error::Validation(format!("email is already registered: {}", email)))
            }
            Err(e) => return Err(e),
        };
        tracing::info!("👤 Registered user {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        let not_found = || Error::NotFound("User".to_string());
        let id = RecordId::parse(id).map_err(|_| not_found())?;
        self.storage.get_user(&id).await?.ok_or_else(not_found)
    }

    /// The user's predictions in the order they were added.
    pub async fn user_history(&self, id: &str) -> Result<Vec<PopulatedPrediction>> {
        let user = self.get_user(id).await?;
        let mut predictions = Vec::with_capacity(user.history.len());
        for prediction_id in &user.history {
            match self.storage.get_prediction(prediction_id).await? {
                Some(prediction) => predictions.push(prediction),
                None => tracing::warn!("User {} history references missing prediction {}", user.id, prediction_id),
            }
        }
        try_join_all(
            predictions
                .into_iter()
                .map(|prediction| populate(self.storage.as_ref(), prediction, false)),
        )
        .await
    }
}
