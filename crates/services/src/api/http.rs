use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use quiz_core::model::{
    AccessToken, Credentials, Page, Question, QuestionId, ResultDetail, ResultId, ResultReport,
    ResultSummary,
};

use super::{LoginResponse, QuestionQuery, QuizApi};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// `reqwest`-backed client for the quiz REST API.
pub struct HttpQuizApi {
    client: Client,
    base_url: Url,
    token: RwLock<Option<AccessToken>>,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `ApiError::Connection` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn current_token(&self) -> Option<AccessToken> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match self.current_token() {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorized(request).send().await.inspect_err(|err| {
            warn!(error = %err, "request failed before a response arrived");
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_from_status(status, &body);
        warn!(%status, error = %err, "request rejected");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let bytes = self.send(request).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Classify a non-success response, preferring the server's `{message}`.
fn error_from_status(status: StatusCode, body: &str) -> ApiError {
    if status == StatusCode::UNAUTHORIZED {
        return ApiError::Unauthorized;
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.to_string(), str::to_owned)
        });

    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(message)
    } else {
        ApiError::Status { status, message }
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    fn set_access_token(&self, token: Option<AccessToken>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        debug!(email = %credentials.email, "logging in");
        let url = self.endpoint("auth/login")?;
        self.send_json(self.client.post(url).json(credentials)).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint("auth/logout")?;
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Page<Question>, ApiError> {
        debug!(subject = %query.subject, grade = %query.grade, page = query.page, "fetching questions");
        let url = self.endpoint("questoes")?;
        let request = self.client.get(url).query(&[
            ("page", query.page.to_string()),
            ("disciplina", query.subject.code().to_owned()),
            ("ano", query.grade.to_string()),
            ("shuffle", query.shuffle.to_string()),
        ]);
        self.send_json(request).await
    }

    async fn fetch_question(&self, id: &QuestionId) -> Result<Question, ApiError> {
        let url = self.endpoint(&format!("questoes/{id}"))?;
        self.send_json(self.client.get(url)).await
    }

    async fn submit_result(&self, report: &ResultReport) -> Result<Value, ApiError> {
        debug!(subject = %report.subject, correct = report.correct, total = report.total, "submitting result");
        let url = self.endpoint("resultados")?;
        let bytes = self
            .send(self.client.put(url).json(report))
            .await?
            .bytes()
            .await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn list_results(
        &self,
        page: u32,
        email: &str,
    ) -> Result<Page<ResultSummary>, ApiError> {
        let url = self.endpoint("resultados")?;
        let request = self
            .client
            .get(url)
            .query(&[("page", page.to_string()), ("email", email.to_owned())]);
        self.send_json(request).await
    }

    async fn fetch_result(&self, id: &ResultId) -> Result<ResultDetail, ApiError> {
        let url = self.endpoint(&format!("resultados/{id}"))?;
        self.send_json(self.client.get(url)).await
    }
}
