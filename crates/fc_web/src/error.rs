use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fc_core::Error;
use serde_json::json;

/// Maps domain errors onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidIdentifier(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            tracing::error!("Request failed: {}", self.0);
            "Server Error".to_string()
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(Error::InvalidIdentifier("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(Error::Validation("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(Error::NotFound("Article".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(Error::Database("disk full".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError(Error::DuplicateKey("k".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
