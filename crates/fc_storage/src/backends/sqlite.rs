use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use fc_core::{
    Article, ArticleStorage, Error, Feedback, FeedbackStorage, NewArticle, NewFeedback, NewUser,
    Prediction, PredictionStorage, RecordId, Result, User, UserStorage,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::StorageBackend;

pub const DEFAULT_DB_PATH: &str = "fakecheck.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        url TEXT,
        domain TEXT,
        reliability_score REAL NOT NULL,
        submitted_by TEXT REFERENCES users(id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id TEXT PRIMARY KEY,
        article_id TEXT NOT NULL UNIQUE REFERENCES articles(id),
        label TEXT NOT NULL CHECK (label IN ('Likely True', 'Uncertain', 'Likely False')),
        confidence REAL NOT NULL CHECK (confidence >= 0 AND confidence <= 1),
        explanation TEXT NOT NULL,
        evidence_links TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_history (
        position INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL REFERENCES users(id),
        prediction_id TEXT NOT NULL REFERENCES predictions(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_user_history_user ON user_history (user_id, position)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)",
    r#"
    CREATE TABLE IF NOT EXISTS feedback (
        position INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        prediction_id TEXT NOT NULL REFERENCES predictions(id),
        rating TEXT NOT NULL CHECK (rating IN ('helpful', 'not_helpful')),
        comment TEXT,
        user_id TEXT REFERENCES users(id),
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_feedback_prediction ON feedback (prediction_id, position)",
    // Add future migrations here
];

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

/// Fixed-width timestamps so that text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date '{}': {}", raw, e)))
}

fn parse_id(raw: &str) -> Result<RecordId> {
    RecordId::parse(raw).map_err(|_| Error::Database(format!("Corrupt record id '{}'", raw)))
}

fn column<T>(row: &SqliteRow, name: &str) -> Result<T>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| Error::Database(format!("Failed to read column {}: {}", name, e)))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let submitted_by = column::<Option<String>>(row, "submitted_by")?
        .as_deref()
        .map(parse_id)
        .transpose()?;
    Ok(Article {
        id: parse_id(&column::<String>(row, "id")?)?,
        title: column(row, "title")?,
        content: column(row, "content")?,
        url: column(row, "url")?,
        domain: column(row, "domain")?,
        reliability_score: column(row, "reliability_score")?,
        submitted_by,
        created_at: parse_timestamp(&column::<String>(row, "created_at")?)?,
    })
}

fn prediction_from_row(row: &SqliteRow) -> Result<Prediction> {
    let evidence_links: Vec<String> = serde_json::from_str(&column::<String>(row, "evidence_links")?)?;
    let label = column::<String>(row, "label")?
        .parse()
        .map_err(|e| Error::Database(format!("Corrupt prediction label: {}", e)))?;
    Ok(Prediction {
        id: parse_id(&column::<String>(row, "id")?)?,
        article_id: parse_id(&column::<String>(row, "article_id")?)?,
        label,
        confidence: column(row, "confidence")?,
        explanation: column(row, "explanation")?,
        evidence_links,
        created_at: parse_timestamp(&column::<String>(row, "created_at")?)?,
    })
}

fn feedback_from_row(row: &SqliteRow) -> Result<Feedback> {
    let rating = column::<String>(row, "rating")?
        .parse()
        .map_err(|e| Error::Database(format!("Corrupt feedback rating: {}", e)))?;
    let user_id = column::<Option<String>>(row, "user_id")?
        .as_deref()
        .map(parse_id)
        .transpose()?;
    Ok(Feedback {
        id: parse_id(&column::<String>(row, "id")?)?,
        prediction_id: parse_id(&column::<String>(row, "prediction_id")?)?,
        rating,
        comment: column(row, "comment")?,
        user_id,
        created_at: parse_timestamp(&column::<String>(row, "created_at")?)?,
    })
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at the configured path"
    }

    async fn open(url: Option<&str>) -> Result<Self> {
        let path = url
            .map(|u| u.trim_start_matches("sqlite://").trim_start_matches("sqlite:"))
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_DB_PATH);
        Self::new_with_path(Path::new(path)).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        tracing::debug!("Opened SQLite database at {}", db_path.display());
        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn history_of(&self, user_id: &RecordId) -> Result<Vec<RecordId>> {
        let rows = sqlx::query(
            "SELECT prediction_id FROM user_history WHERE user_id = ? ORDER BY position",
        )
        .bind(user_id.to_string())
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error("Failed to load user history"))?;

        rows.iter()
            .map(|row| parse_id(&column::<String>(row, "prediction_id")?))
            .collect()
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn insert_article(&self, article: NewArticle) -> Result<Article> {
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

        sqlx::query(
            r#"
            INSERT INTO articles
            (id, title, content, url, domain, reliability_score, submitted_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.url.as_deref())
        .bind(article.domain.as_deref())
        .bind(article.reliability_score)
        .bind(article.submitted_by.map(|id| id.to_string()))
        .bind(format_timestamp(&article.created_at))
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store article"))?;

        Ok(article)
    }

    async fn get_article(&self, id: &RecordId) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get article"))?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn list_articles(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY created_at DESC, id DESC")
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list articles"))?;
        rows.iter().map(article_from_row).collect()
    }
}

#[async_trait]
impl PredictionStorage for SQLiteStorage {
    async fn insert_prediction(&self, prediction: &Prediction) -> Result<()> {
        let evidence_links = serde_json::to_string(&prediction.evidence_links)?;

        let result = sqlx::query(
            r#"
            INSERT INTO predictions
            (id, article_id, label, confidence, explanation, evidence_links, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(prediction.id.to_string())
        .bind(prediction.article_id.to_string())
        .bind(prediction.label.as_str())
        .bind(prediction.confidence)
        .bind(&prediction.explanation)
        .bind(evidence_links)
        .bind(format_timestamp(&prediction.created_at))
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::DuplicateKey(
                format!("prediction for article {}", prediction.article_id),
            )),
            Err(e) => Err(Error::Database(format!("Failed to store prediction: {}", e))),
        }
    }

    async fn get_prediction(&self, id: &RecordId) -> Result<Option<Prediction>> {
        let row = sqlx::query("SELECT * FROM predictions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get prediction"))?;
        row.as_ref().map(prediction_from_row).transpose()
    }

    async fn get_prediction_by_article(&self, article_id: &RecordId) -> Result<Option<Prediction>> {
        let row = sqlx::query("SELECT * FROM predictions WHERE article_id = ?")
            .bind(article_id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get prediction by article"))?;
        row.as_ref().map(prediction_from_row).transpose()
    }

    async fn list_predictions(&self) -> Result<Vec<Prediction>> {
        let rows = sqlx::query("SELECT * FROM predictions ORDER BY created_at DESC, id DESC")
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list predictions"))?;
        rows.iter().map(prediction_from_row).collect()
    }
}

#[async_trait]
impl UserStorage for SQLiteStorage {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let user = User {
            id: RecordId::new(),
            name: user.name,
            email: user.email,
            history: Vec::new(),
            created_at: Utc::now(),
        };

        let result = sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(&user.email)
            .bind(format_timestamp(&user.created_at))
            .execute(&*self.pool)
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(Error::DuplicateKey(format!("user email {}", user.email)))
            }
            Err(e) => Err(Error::Database(format!("Failed to store user: {}", e))),
        }
    }

    async fn get_user(&self, id: &RecordId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get user"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(User {
            id: parse_id(&column::<String>(&row, "id")?)?,
            name: column(&row, "name")?,
            email: column(&row, "email")?,
            history: self.history_of(id).await?,
            created_at: parse_timestamp(&column::<String>(&row, "created_at")?)?,
        }))
    }

    async fn append_history(&self, user_id: &RecordId, prediction_id: &RecordId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_history (user_id, prediction_id)
            SELECT ?, ? WHERE EXISTS (SELECT 1 FROM users WHERE id = ?)
            "#,
        )
        .bind(user_id.to_string())
        .bind(prediction_id.to_string())
        .bind(user_id.to_string())
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to append user history"))?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl FeedbackStorage for SQLiteStorage {
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        let feedback = Feedback {
            id: RecordId::new(),
            prediction_id: feedback.prediction_id,
            rating: feedback.rating,
            comment: feedback.comment,
            user_id: feedback.user_id,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO feedback (id, prediction_id, rating, comment, user_id, created_at)
            SELECT ?, ?, ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM predictions WHERE id = ?)
            "#,
        )
        .bind(feedback.id.to_string())
        .bind(feedback.prediction_id.to_string())
        .bind(feedback.rating.as_str())
        .bind(feedback.comment.as_deref())
        .bind(feedback.user_id.map(|id| id.to_string()))
        .bind(format_timestamp(&feedback.created_at))
        .bind(feedback.prediction_id.to_string())
        .execute(&*self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => Ok(feedback),
            Ok(_) => Err(Error::NotFound("Prediction".to_string())),
            // The statement already requires the prediction, so this is the user
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(Error::NotFound("User".to_string()))
            }
            Err(e) => Err(Error::Database(format!("Failed to store feedback: {}", e))),
        }
    }

    async fn list_feedback(&self, prediction_id: &RecordId) -> Result<Vec<Feedback>> {
        let rows = sqlx::query("SELECT * FROM feedback WHERE prediction_id = ? ORDER BY position")
            .bind(prediction_id.to_string())
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list feedback"))?;
        rows.iter().map(feedback_from_row).collect()
    }
}
