use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/predictions", get(handlers::list_predictions).post(handlers::create_prediction))
        .route("/predictions/:id", get(handlers::get_prediction))
        .route("/predictions/article/:article_id", get(handlers::get_prediction_by_article))
        .route("/articles", get(handlers::list_articles).post(handlers::create_article))
        .route("/articles/:id", get(handlers::get_article))
        .route("/users", axum::routing::post(handlers::create_user))
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id/history", get(handlers::get_user_history))
        .route("/feedback", axum::routing::post(handlers::create_feedback))
        .route("/feedback/community", get(handlers::community))
        .route("/feedback/prediction/:prediction_id", get(handlers::list_prediction_feedback))
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .nest("/api", api_routes())
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve the API on `addr` until Ctrl-C is received.
pub async fn serve(addr: SocketAddr, state: AppState) -> fc_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}/api", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

pub mod prelude {
    pub use fc_core::{Article, Error, Prediction, Result};
    pub use crate::{create_app, serve, AppState};
}
