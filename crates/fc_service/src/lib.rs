use std::sync::Arc;
use fc_core::{AnalysisProvider, Storage};

pub mod articles;
pub mod feedback;
pub mod logging;
pub mod predictions;
pub mod users;

pub use articles::ArticleService;
pub use feedback::FeedbackService;
pub use logging::{init_logging, Logger};
pub use predictions::{Outcome, PredictionService};
pub use users::UserService;

/// The application services sharing one store and one analysis provider.
#[derive(Clone)]
pub struct Services {
    pub predictions: PredictionService,
    pub articles: ArticleService,
    pub users: UserService,
    pub feedback: FeedbackService,
}

impl Services {
    pub fn new(storage: Arc<dyn Storage>, analyzer: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            predictions: PredictionService::new(storage.clone(), analyzer),
            articles: ArticleService::new(storage.clone()),
            users: UserService::new(storage.clone()),
            feedback: FeedbackService::new(storage),
        }
    }
}

pub mod prelude {
    pub use super::{ArticleService, FeedbackService, Outcome, PredictionService, Services, UserService};
    pub use fc_core::{Error, Result};
}
