//! Contract of the remote quiz API and its HTTP implementation.

mod http;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use quiz_core::model::{
    AccessToken, Credentials, Grade, Page, Question, QuestionId, ResultDetail, ResultId,
    ResultReport, ResultSummary, Subject,
};

use crate::error::ApiError;

pub use http::HttpQuizApi;

/// Query for one page of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub page: u32,
    pub subject: Subject,
    pub grade: Grade,
    pub shuffle: bool,
}

impl QuestionQuery {
    /// First page, shuffled: what a quiz attempt asks for.
    #[must_use]
    pub fn first_page(subject: Subject, grade: Grade) -> Self {
        Self {
            page: 1,
            subject,
            grade,
            shuffle: true,
        }
    }
}

/// Body returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<AccessToken>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Remote quiz API.
///
/// Every call carries the bearer token set through `set_access_token`.
/// Implementations classify failures into `ApiError`; a 401 always maps to
/// `ApiError::Unauthorized`.
#[async_trait]
pub trait QuizApi: Send + Sync {
    fn set_access_token(&self, token: Option<AccessToken>);

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Page<Question>, ApiError>;

    async fn fetch_question(&self, id: &QuestionId) -> Result<Question, ApiError>;

    async fn submit_result(&self, report: &ResultReport) -> Result<Value, ApiError>;

    async fn list_results(&self, page: u32, email: &str)
    -> Result<Page<ResultSummary>, ApiError>;

    async fn fetch_result(&self, id: &ResultId) -> Result<ResultDetail, ApiError>;
}
