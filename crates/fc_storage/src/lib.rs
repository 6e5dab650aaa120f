use async_trait::async_trait;
use fc_core::{Error, Result, Storage};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Storage {
    fn get_error_message() -> &'static str;

    /// Open the backend. `url` is backend specific (a file path for SQLite).
    async fn open(url: Option<&str>) -> Result<Self> where Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    SQLite,
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Memory
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::SQLite),
            other => Err(Error::Storage(format!(
                "Unknown storage backend '{}'. Available backends: memory, sqlite",
                other
            ))),
        }
    }
}

async fn open_backend<T: StorageBackend + 'static>(url: Option<&str>) -> Result<Arc<dyn Storage>> {
    let storage = T::open(url)
        .await
        .map_err(|e| Error::Storage(format!("{}: {}", T::get_error_message(), e)))?;
    Ok(Arc::new(storage))
}

/// Build the storage backend named by `kind`.
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Arc<dyn Storage>> {
    let kind: StorageKind = kind.parse()?;
    let storage = match kind {
        StorageKind::Memory => open_backend::<InMemoryStorage>(url).await?,
        #[cfg(feature = "sqlite")]
        StorageKind::SQLite => open_backend::<SQLiteStorage>(url).await?,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::SQLite => {
            return Err(Error::Storage(
                "SQLite support was not compiled in (enable the `sqlite` feature)".to_string(),
            ))
        }
    };
    info!("💾 Storage backend ready ({:?})", kind);
    Ok(storage)
}

pub mod prelude {
    pub use super::{create_storage, StorageBackend, StorageKind};
    pub use super::backends::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::NewArticle;

    #[test]
    fn test_storage_kind_parsing() {
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!(" SQLite ".parse::<StorageKind>().unwrap(), StorageKind::SQLite);
        assert!("mongodb".parse::<StorageKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        let article = storage
            .insert_article(NewArticle::new("Title", "Content"))
            .await
            .unwrap();
        assert!(storage.get_article(&article.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_unknown_storage() {
        assert!(create_storage("redis", None).await.is_err());
    }
}
