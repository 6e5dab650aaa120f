use async_trait::async_trait;
use crate::types::{Article, Feedback, NewArticle, NewFeedback, NewUser, Prediction, RecordId, User};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store a submitted article, assigning its id and creation time
    async fn insert_article(&self, article: NewArticle) -> Result<Article>;

    async fn get_article(&self, id: &RecordId) -> Result<Option<Article>>;

    /// All articles, newest first
    async fn list_articles(&self) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait PredictionStorage: Send + Sync {
    /// Store a prediction.
    ///
    /// Fails with [`crate::Error::DuplicateKey`] when the article already has one.
    async fn insert_prediction(&self, prediction: &Prediction) -> Result<()>;

    async fn get_prediction(&self, id: &RecordId) -> Result<Option<Prediction>>;

    async fn get_prediction_by_article(&self, article_id: &RecordId) -> Result<Option<Prediction>>;

    /// All predictions, newest first
    async fn list_predictions(&self) -> Result<Vec<Prediction>>;
}

#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Fails with [`crate::Error::DuplicateKey`] when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: &RecordId) -> Result<Option<User>>;

    /// Append a prediction to the user's history. Returns false if the user does not exist.
    async fn append_history(&self, user_id: &RecordId, prediction_id: &RecordId) -> Result<bool>;
}

#[async_trait]
pub trait FeedbackStorage: Send + Sync {
    /// Store feedback on an existing prediction, assigning its id and creation time.
    ///
    /// Fails with [`crate::Error::NotFound`] when the prediction or the user is unknown.
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback>;

    /// Feedback left on a prediction, oldest first
    async fn list_feedback(&self, prediction_id: &RecordId) -> Result<Vec<Feedback>>;
}

/// Everything the application persists, behind one handle.
pub trait Storage: ArticleStorage + PredictionStorage + UserStorage + FeedbackStorage {}

impl<T> Storage for T where T: ArticleStorage + PredictionStorage + UserStorage + FeedbackStorage {}
