use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::{Error, Result};

/// Opaque record identifier shared by articles, predictions and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier coming from a request, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.parse()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Uuid::try_parse(trimmed)
            .map(Self)
            .map_err(|_| Error::InvalidIdentifier(trimmed.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Likely True")]
    LikelyTrue,
    #[serde(rename = "Uncertain")]
    Uncertain,
    #[serde(rename = "Likely False")]
    LikelyFalse,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::LikelyTrue, Label::Uncertain, Label::LikelyFalse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::LikelyTrue => "Likely True",
            Label::Uncertain => "Uncertain",
            Label::LikelyFalse => "Likely False",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Label::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::MalformedAnalysisOutput(format!("unknown label: {}", trimmed)))
    }
}

/// The fields an analysis provider looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub reliability_score: f64,
}

impl From<&Article> for AnalysisInput {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
            url: article.url.clone(),
            domain: article.domain.clone(),
            reliability_score: article.reliability_score,
        }
    }
}

/// Outcome of analysing one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub label: Label,
    pub confidence: f64,
    pub explanation: String,
    pub evidence_links: Vec<String>,
}

impl Verdict {
    pub const PARSING_ERROR_EXPLANATION: &'static str = "Parsing error";

    /// Substituted when the language model answers with something that is not a verdict.
    pub fn parsing_error() -> Self {
        Self {
            label: Label::Uncertain,
            confidence: 0.5,
            explanation: Self::PARSING_ERROR_EXPLANATION.to_string(),
            evidence_links: Vec::new(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
            && !self.explanation.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub reliability_score: f64,
    pub submitted_by: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_RELIABILITY_SCORE: f64 = 0.5;

fn default_reliability_score() -> f64 {
    DEFAULT_RELIABILITY_SCORE
}

/// An article as submitted, before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_reliability_score")]
    pub reliability_score: f64,
    #[serde(default)]
    pub submitted_by: Option<RecordId>,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: None,
            domain: None,
            reliability_score: DEFAULT_RELIABILITY_SCORE,
            submitted_by: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_reliability(mut self, score: f64) -> Self {
        self.reliability_score = score;
        self
    }

    pub fn submitted_by(mut self, user: RecordId) -> Self {
        self.submitted_by = Some(user);
        self
    }

    /// Trims text fields, checks ranges and fills in the domain from the url.
    pub fn normalize(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if content.is_empty() {
            return Err(Error::Validation("content is required".to_string()));
        }
        if !self.reliability_score.is_finite() || !(0.0..=1.0).contains(&self.reliability_score) {
            return Err(Error::Validation(format!(
                "reliabilityScore must be between 0 and 1, got {}",
                self.reliability_score
            )));
        }

        let url = match self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(raw) => Some(parse_http_url(raw).ok_or_else(|| {
                Error::Validation(format!("url is not a valid http(s) address: {}", raw))
            })?),
            None => None,
        };

        let domain = self
            .domain
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .or_else(|| url.as_ref().and_then(|u| u.host_str()).map(str::to_string));

        Ok(Self {
            title,
            content,
            url: url.map(String::from),
            domain,
            reliability_score: self.reliability_score,
            submitted_by: self.submitted_by,
        })
    }
}

/// Returns the parsed url when `raw` is an absolute http or https address.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    Url::parse(raw.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: RecordId,
    pub article_id: RecordId,
    #[serde(rename = "predictedLabel")]
    pub label: Label,
    #[serde(rename = "confidenceScore")]
    pub confidence: f64,
    pub explanation: String,
    pub evidence_links: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn from_verdict(article_id: RecordId, verdict: Verdict) -> Self {
        Self {
            id: RecordId::new(),
            article_id,
            label: verdict.label,
            confidence: verdict.confidence,
            explanation: verdict.explanation,
            evidence_links: verdict.evidence_links,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub history: Vec<RecordId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn normalize(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        match email.split_once('@') {
            Some((local, host)) if !local.is_empty() && host.contains('.') => {}
            _ => return Err(Error::Validation(format!("email is not valid: {}", email))),
        }
        Ok(Self { name, email })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: RecordId,
    pub name: String,
    pub email: String,
}

/// A reader's rating of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackRating {
    Helpful,
    NotHelpful,
}

impl FeedbackRating {
    pub const ALL: [FeedbackRating; 2] = [FeedbackRating::Helpful, FeedbackRating::NotHelpful];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackRating::Helpful => "helpful",
            FeedbackRating::NotHelpful => "not_helpful",
        }
    }
}

impl fmt::Display for FeedbackRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackRating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        FeedbackRating::ALL
            .into_iter()
            .find(|rating| rating.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "feedback must be 'helpful' or 'not_helpful', got '{}'",
                    trimmed
                ))
            })
    }
}

pub const MAX_FEEDBACK_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: RecordId,
    pub prediction_id: RecordId,
    #[serde(rename = "feedback")]
    pub rating: FeedbackRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub user_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
}

/// Feedback as submitted, before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub prediction_id: RecordId,
    pub rating: FeedbackRating,
    pub comment: Option<String>,
    pub user_id: Option<RecordId>,
}

impl NewFeedback {
    pub fn new(prediction_id: RecordId, rating: FeedbackRating) -> Self {
        Self {
            prediction_id,
            rating,
            comment: None,
            user_id: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn from_user(mut self, user: RecordId) -> Self {
        self.user_id = Some(user);
        self
    }

    /// Trims the comment, dropping it when blank, and bounds its length.
    pub fn normalize(self) -> Result<Self> {
        let comment = self
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(comment) = &comment {
            let chars = comment.chars().count();
            if chars > MAX_FEEDBACK_COMMENT_CHARS {
                return Err(Error::Validation(format!(
                    "comment is limited to {} characters, got {}",
                    MAX_FEEDBACK_COMMENT_CHARS, chars
                )));
            }
        }
        Ok(Self { comment, ..self })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTally {
    pub helpful: usize,
    pub not_helpful: usize,
}

impl FeedbackTally {
    pub fn record(&mut self, rating: FeedbackRating) {
        match rating {
            FeedbackRating::Helpful => self.helpful += 1,
            FeedbackRating::NotHelpful => self.not_helpful += 1,
        }
    }
}

impl<'a> FromIterator<&'a Feedback> for FeedbackTally {
    fn from_iter<I: IntoIterator<Item = &'a Feedback>>(iter: I) -> Self {
        let mut tally = Self::default();
        for feedback in iter {
            tally.record(feedback.rating);
        }
        tally
    }
}

/// An article with its submitter resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedArticle {
    #[serde(flatten)]
    pub article: Article,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter: Option<UserSummary>,
}

/// A prediction with its article (and possibly the submitter) resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedPrediction {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub article: Option<PopulatedArticle>,
}

/// A prediction as listed on the community page, with what readers said about it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    #[serde(flatten)]
    pub prediction: PopulatedPrediction,
    #[serde(flatten)]
    pub tally: FeedbackTally,
    /// Feedback that carries a comment, oldest first
    pub comments: Vec<Feedback>,
}
