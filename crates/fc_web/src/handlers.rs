use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use fc_core::{
    Article, CommunityPost, Error, Feedback, FeedbackRating, NewArticle, NewFeedback, NewUser,
    PopulatedPrediction, Prediction, RecordId, User,
};
use fc_service::Outcome;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// Envelope shared by every successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

fn ok<T>(status: StatusCode, data: T) -> ApiResult<T> {
    Ok((status, Json(ApiResponse { success: true, message: None, count: None, data })))
}

fn ok_list<T>(data: Vec<T>) -> ApiResult<Vec<T>> {
    let count = data.len();
    Ok((
        StatusCode::OK,
        Json(ApiResponse { success: true, message: None, count: Some(count), data }),
    ))
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError(Error::Validation(rejection.body_text())))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "FakeCheck API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    #[serde(default)]
    pub article_id: Option<String>,
}

pub async fn create_prediction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> ApiResult<Prediction> {
    let request = parse_body(payload)?;
    let article_id = request.article_id.unwrap_or_default();
    let (prediction, outcome) = state
        .services
        .predictions
        .get_or_create_prediction(&article_id)
        .await?;

    let (status, message) = match outcome {
        Outcome::Created => (StatusCode::CREATED, None),
        Outcome::Existing => (StatusCode::OK, Some("Prediction already exists".to_string())),
    };
    Ok((
        status,
        Json(ApiResponse { success: true, message, count: None, data: prediction }),
    ))
}

pub async fn list_predictions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<PopulatedPrediction>> {
    ok_list(state.services.predictions.list_predictions().await?)
}

pub async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<PopulatedPrediction> {
    ok(StatusCode::OK, state.services.predictions.get_prediction(&id).await?)
}

pub async fn get_prediction_by_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<String>,
) -> ApiResult<PopulatedPrediction> {
    ok(
        StatusCode::OK,
        state.services.predictions.get_prediction_for_article(&article_id).await?,
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub reliability_score: Option<f64>,
    #[serde(default)]
    pub submitted_by: Option<String>,
}

impl TryFrom<ArticleRequest> for NewArticle {
    type Error = Error;

    fn try_from(request: ArticleRequest) -> Result<Self, Error> {
        let mut article = NewArticle::new(request.title, request.content);
        article.url = request.url;
        article.domain = request.domain;
        if let Some(score) = request.reliability_score {
            article.reliability_score = score;
        }
        article.submitted_by = request
            .submitted_by
            .as_deref()
            .map(RecordId::parse)
            .transpose()?;
        Ok(article)
    }
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ArticleRequest>, JsonRejection>,
) -> ApiResult<Article> {
    let article = NewArticle::try_from(parse_body(payload)?)?;
    ok(StatusCode::CREATED, state.services.articles.submit_article(article).await?)
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Article>> {
    ok_list(state.services.articles.list_articles().await?)
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Article> {
    ok(StatusCode::OK, state.services.articles.get_article(&id).await?)
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<User> {
    let user = parse_body(payload)?;
    ok(StatusCode::CREATED, state.services.users.register_user(user).await?)
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    ok(StatusCode::OK, state.services.users.get_user(&id).await?)
}

pub async fn get_user_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<PopulatedPrediction>> {
    ok_list(state.services.users.user_history(&id).await?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default, alias = "verificationId")]
    pub prediction_id: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TryFrom<FeedbackRequest> for NewFeedback {
    type Error = Error;

    fn try_from(request: FeedbackRequest) -> Result<Self, Error> {
        let prediction_id = request
            .prediction_id
            .ok_or_else(|| Error::Validation("predictionId is required".to_string()))?;
        let rating: FeedbackRating = request
            .feedback
            .ok_or_else(|| Error::Validation("feedback is required".to_string()))?
            .parse()?;
        Ok(NewFeedback {
            prediction_id: RecordId::parse(&prediction_id)?,
            rating,
            comment: request.comment,
            user_id: request.user_id.as_deref().map(RecordId::parse).transpose()?,
        })
    }
}

pub async fn create_feedback(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> ApiResult<Feedback> {
    let feedback = NewFeedback::try_from(parse_body(payload)?)?;
    ok(StatusCode::CREATED, state.services.feedback.submit_feedback(feedback).await?)
}

pub async fn list_prediction_feedback(
    State(state): State<Arc<AppState>>,
    Path(prediction_id): Path<String>,
) -> ApiResult<Vec<Feedback>> {
    ok_list(state.services.feedback.feedback_for_prediction(&prediction_id).await?)
}

pub async fn community(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CommunityPost>> {
    ok_list(state.services.feedback.community_posts().await?)
}
