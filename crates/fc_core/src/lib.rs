pub mod models;
pub mod error;
pub mod storage;
pub mod types;

pub use error::Error;
pub use models::{AnalysisProvider, InferenceModel};
pub use storage::{ArticleStorage, FeedbackStorage, PredictionStorage, Storage, UserStorage};
pub use types::*;

pub type Result<T> = std::result::Result<T, Error>;
