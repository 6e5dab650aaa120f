use async_trait::async_trait;
use chrono::Utc;
use fc_core::{
    Article, ArticleStorage, Error, Feedback, FeedbackStorage, NewArticle, NewFeedback, NewUser,
    Prediction, PredictionStorage, RecordId, Result, User, UserStorage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: HashMap<RecordId, Article>,
    predictions: HashMap<RecordId, Prediction>,
    prediction_by_article: HashMap<RecordId, RecordId>,
    users: HashMap<RecordId, User>,
    feedback: HashMap<RecordId, Vec<Feedback>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_article(&mut self, article: NewArticle) -> Article {
        let article = Article {
            id: RecordId::new(),
            title: article.title,
            content: article.content,
            url: article.url,
            domain: article.domain,
            reliability_score: article.reliability_score,
            submitted_by: article.submitted_by,
            created_at: Utc::now(),
        };
        self.articles.insert(article.id, article.clone());
        article
    }

    pub fn list_articles(&self) -> Vec<Article> {
        let mut articles: Vec<Article> = self.articles.values().cloned().collect();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        articles
    }

    pub fn insert_prediction(&mut self, prediction: &Prediction) -> Result<()> {
        if self.prediction_by_article.contains_key(&prediction.article_id) {
            return Err(Error::DuplicateKey(format!(
                "prediction for article {}",
                prediction.article_id
            )));
        }
        if self.predictions.contains_key(&prediction.id) {
            return Err(Error::DuplicateKey(format!("prediction {}", prediction.id)));
        }
        self.prediction_by_article.insert(prediction.article_id, prediction.id);
        self.predictions.insert(prediction.id, prediction.clone());
        Ok(())
    }

    pub fn get_prediction_by_article(&self, article_id: &RecordId) -> Option<Prediction> {
        self.prediction_by_article
            .get(article_id)
            .and_then(|id| self.predictions.get(id))
            .cloned()
    }

    pub fn list_predictions(&self) -> Vec<Prediction> {
        let mut predictions: Vec<Prediction> = self.predictions.values().cloned().collect();
        predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        predictions
    }

    pub fn insert_user(&mut self, user: NewUser) -> Result<User> {
        if self.users.values().any(|existing| existing.email == user.email) {
            return Err(Error::DuplicateKey(format!("user email {}", user.email)));
        }
        let user = User {
            id: RecordId::new(),
            name: user.name,
            email: user.email,
            history: Vec::new(),
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn insert_feedback(&mut self, feedback: NewFeedback) -> Result<Feedback> {
        if !self.predictions.contains_key(&feedback.prediction_id) {
            return Err(Error::NotFound("Prediction".to_string()));
        }
        if let Some(user_id) = &feedback.user_id {
            if !self.users.contains_key(user_id) {
                return Err(Error::NotFound("User".to_string()));
            }
        }
        let feedback = Feedback {
            id: RecordId::new(),
            prediction_id: feedback.prediction_id,
            rating: feedback.rating,
            comment: feedback.comment,
            user_id: feedback.user_id,
            created_at: Utc::now(),
        };
        self.feedback
            .entry(feedback.prediction_id)
            .or_default()
            .push(feedback.clone());
        Ok(feedback)
    }

    pub fn append_history(&mut self, user_id: &RecordId, prediction_id: &RecordId) -> bool {
        match self.users.get_mut(user_id) {
            Some(user) => {
                user.history.push(*prediction_id);
                true
            }
            None => false,
        }
    }
}

/// Process-local storage. Contents are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn prediction_count(&self) -> usize {
        self.store.read().await.predictions.len()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn open(_url: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn insert_article(&self, article: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.insert_article(article))
    }

    async fn get_article(&self, id: &RecordId) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.get(id).cloned())
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list_articles())
    }
}

#[async_trait]
impl PredictionStorage for InMemoryStorage {
    async fn insert_prediction(&self, prediction: &Prediction) -> Result<()> {
        let mut store = self.store.write().await;
        store.insert_prediction(prediction)
    }

    async fn get_prediction(&self, id: &RecordId) -> Result<Option<Prediction>> {
        let store = self.store.read().await;
        Ok(store.predictions.get(id).cloned())
    }

    async fn get_prediction_by_article(&self, article_id: &RecordId) -> Result<Option<Prediction>> {
        let store = self.store.read().await;
        Ok(store.get_prediction_by_article(article_id))
    }

    async fn list_predictions(&self) -> Result<Vec<Prediction>> {
        let store = self.store.read().await;
        Ok(store.list_predictions())
    }
}

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut store = self.store.write().await;
        store.insert_user(user)
    }

    async fn get_user(&self, id: &RecordId) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.get(id).cloned())
    }

    async fn append_history(&self, user_id: &RecordId, prediction_id: &RecordId) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.append_history(user_id, prediction_id))
    }
}

#[async_trait]
impl FeedbackStorage for InMemoryStorage {
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        let mut store = self.store.write().await;
        store.insert_feedback(feedback)
    }

    async fn list_feedback(&self, prediction_id: &RecordId) -> Result<Vec<Feedback>> {
        let store = self.store.read().await;
        Ok(store.feedback.get(prediction_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{FeedbackRating, Label, Verdict};

    fn verdict() -> Verdict {
        Verdict {
            label: Label::LikelyTrue,
            confidence: 0.9,
            explanation: "Consistent with other reporting.".to_string(),
            evidence_links: vec!["https://example.com/source".to_string()],
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = InMemoryStorage::new();
        let article = storage
            .insert_article(NewArticle::new("Test Article", "This is a test article about politics."))
            .await
            .unwrap();

        let fetched = storage.get_article(&article.id).await.unwrap().unwrap();
        assert_eq!(fetched, article);
        assert!(storage.get_article(&RecordId::new()).await.unwrap().is_none());

        let prediction = Prediction::from_verdict(article.id, verdict());
        storage.insert_prediction(&prediction).await.unwrap();

        let by_article = storage.get_prediction_by_article(&article.id).await.unwrap();
        assert_eq!(by_article, Some(prediction.clone()));
        let by_id = storage.get_prediction(&prediction.id).await.unwrap();
        assert_eq!(by_id, Some(prediction));
    }

    #[tokio::test]
    async fn test_second_prediction_for_article_is_rejected() {
        let storage = InMemoryStorage::new();
        let article = storage.insert_article(NewArticle::new("t", "c")).await.unwrap();

        let first = Prediction::from_verdict(article.id, verdict());
        let second = Prediction::from_verdict(article.id, Verdict::parsing_error());
        storage.insert_prediction(&first).await.unwrap();

        let err = storage.insert_prediction(&second).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
        assert_eq!(storage.prediction_count().await, 1);
        let kept = storage.get_prediction_by_article(&article.id).await.unwrap().unwrap();
        assert_eq!(kept.id, first.id);
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let storage = InMemoryStorage::new();
        let older = storage.insert_article(NewArticle::new("older", "c")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = storage.insert_article(NewArticle::new("newer", "c")).await.unwrap();

        let articles = storage.list_articles().await.unwrap();
        assert_eq!(articles.iter().map(|a| a.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let first = Prediction::from_verdict(older.id, verdict());
        storage.insert_prediction(&first).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = Prediction::from_verdict(newer.id, verdict());
        storage.insert_prediction(&second).await.unwrap();

        let predictions = storage.list_predictions().await.unwrap();
        assert_eq!(predictions.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_user_history() {
        let storage = InMemoryStorage::new();
        let user = storage
            .insert_user(NewUser { name: "Ada".to_string(), email: "ada@example.com".to_string() })
            .await
            .unwrap();
        assert!(user.history.is_empty());

        let first = RecordId::new();
        let second = RecordId::new();
        assert!(storage.append_history(&user.id, &first).await.unwrap());
        assert!(storage.append_history(&user.id, &second).await.unwrap());
        assert!(!storage.append_history(&RecordId::new(), &first).await.unwrap());

        let user = storage.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(user.history, vec![first, second]);
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let storage = InMemoryStorage::new();
        let ada = NewUser { name: "Ada".to_string(), email: "ada@example.com".to_string() };
        storage.insert_user(ada.clone()).await.unwrap();

        let again = NewUser { name: "Another Ada".to_string(), ..ada };
        let err = storage.insert_user(again).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        let other = NewUser { name: "Grace".to_string(), email: "grace@example.com".to_string() };
        assert!(storage.insert_user(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_feedback() {
        let storage = InMemoryStorage::new();
        let user = storage
            .insert_user(NewUser { name: "Ada".to_string(), email: "ada@example.com".to_string() })
            .await
            .unwrap();
        let article = storage.insert_article(NewArticle::new("t", "c")).await.unwrap();
        let prediction = Prediction::from_verdict(article.id, verdict());
        storage.insert_prediction(&prediction).await.unwrap();

        let first = storage
            .insert_feedback(NewFeedback::new(prediction.id, FeedbackRating::Helpful).from_user(user.id))
            .await
            .unwrap();
        let second = storage
            .insert_feedback(
                NewFeedback::new(prediction.id, FeedbackRating::NotHelpful).with_comment("Missing context"),
            )
            .await
            .unwrap();

        let listed = storage.list_feedback(&prediction.id).await.unwrap();
        assert_eq!(listed, vec![first, second]);
        assert!(storage.list_feedback(&RecordId::new()).await.unwrap().is_empty());

        let err = storage
            .insert_feedback(NewFeedback::new(RecordId::new(), FeedbackRating::Helpful))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Prediction not found");
        let err = storage
            .insert_feedback(NewFeedback::new(prediction.id, FeedbackRating::Helpful).from_user(RecordId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(storage.list_feedback(&prediction.id).await.unwrap().len(), 2);
    }
}
