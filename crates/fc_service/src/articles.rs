use std::sync::Arc;
use fc_core::{Article, Error, NewArticle, RecordId, Result, Storage};
use tracing::info;

#[derive(Clone)]
pub struct ArticleService {
    storage: Arc<dyn Storage>,
}

impl ArticleService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validate and store a submitted article.
    pub async fn submit_article(&self, article: NewArticle) -> Result<Article> {
        let article = article.normalize()?;
        if let Some(user_id) = &article.submitted_by {
            if self.storage.get_user(user_id).await?.is_none() {
                return Err(Error::NotFound("User".to_string()));
            }
        }
        let article = self.storage.insert_article(article).await?;
        info!("📰 Stored article {} ({})", article.id, article.title);
        Ok(article)
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        self.storage.list_articles().await
    }

    pub async fn get_article(&self, id: &str) -> Result<Article> {
        let not_found = || Error::NotFound("Article".to_string());
        let id = RecordId::parse(id).map_err(|_| not_found())?;
        self.storage.get_article(&id).await?.ok_or_else(not_found)
    }
}
