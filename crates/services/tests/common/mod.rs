#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use quiz_core::model::{
    AccessToken, Credentials, Grade, Page, Question, QuestionId, ResultDetail, ResultId,
    ResultReport, ResultSummary, Subject,
};
use services::{ApiError, LoginResponse, QuestionQuery, QuizApi};

/// Scripted `QuizApi` that records what it was asked.
#[derive(Default)]
pub struct FakeApi {
    pub questions: Mutex<Vec<Question>>,
    pub fail_fetch: Mutex<Option<ApiError>>,
    pub submit_failures: AtomicUsize,
    pub submit_error: Mutex<Option<ApiError>>,
    pub submitted: Mutex<Vec<ResultReport>>,
    pub queries: Mutex<Vec<QuestionQuery>>,
    pub token: Mutex<Option<AccessToken>>,
    pub login_response: Mutex<Option<Value>>,
    pub logout_calls: AtomicUsize,
    pub fail_logout: Mutex<bool>,
    pub result_pages: Mutex<Vec<Page<ResultSummary>>>,
    pub results: Mutex<Vec<ResultDetail>>,
}

impl FakeApi {
    pub fn with_questions(questions: Vec<Question>) -> Self {
        let api = Self::default();
        *api.questions.lock().unwrap() = questions;
        api
    }

    pub fn fail_next_submits(&self, count: usize) {
        self.submit_failures.store(count, Ordering::SeqCst);
    }

    pub fn current_token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| t.expose().to_owned())
    }

    pub fn submitted(&self) -> Vec<ResultReport> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuizApi for FakeApi {
    fn set_access_token(&self, token: Option<AccessToken>) {
        *self.token.lock().unwrap() = token;
    }

    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let body = self
            .login_response
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Unauthorized)?;
        serde_json::from_value(body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_logout.lock().unwrap() {
            return Err(ApiError::Connection("offline".into()));
        }
        Ok(())
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Page<Question>, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(err) = self.fail_fetch.lock().unwrap().take() {
            return Err(err);
        }
        let data = self.questions.lock().unwrap().clone();
        Ok(Page {
            total: data.len() as u64,
            total_pages: 1,
            page: 1,
            limit: 10,
            has_next: false,
            has_prev: false,
            data,
        })
    }

    async fn fetch_question(&self, id: &QuestionId) -> Result<Question, ApiError> {
        self.questions
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id() == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Questão não encontrada".into()))
    }

    async fn submit_result(&self, report: &ResultReport) -> Result<Value, ApiError> {
        if let Some(err) = self.submit_error.lock().unwrap().take() {
            return Err(err);
        }
        let remaining = self.submit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.submit_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ApiError::Connection("connection reset".into()));
        }
        self.submitted.lock().unwrap().push(report.clone());
        Ok(json!({ "success": true }))
    }

    async fn list_results(
        &self,
        page: u32,
        _email: &str,
    ) -> Result<Page<ResultSummary>, ApiError> {
        self.result_pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.page == page)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("page".into()))
    }

    async fn fetch_result(&self, id: &ResultId) -> Result<ResultDetail, ApiError> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Resultado não encontrado".into()))
    }
}

pub fn question(id: &str, subject: Subject, grade: u8, answer_key: &str) -> Question {
    let alternatives: BTreeMap<String, String> = ["A", "B", "C", "D"]
        .into_iter()
        .map(|k| (k.to_string(), format!("alternativa {k}")))
        .collect();
    Question::new(
        QuestionId::new(id),
        format!("EF0{grade}{}-{id}", subject.code()),
        subject,
        Grade::new(i64::from(grade)).unwrap(),
        format!("enunciado {id}"),
        alternatives,
        answer_key,
    )
    .unwrap()
}

/// Stored profile JSON as the login flow would have written it.
pub fn stored_user(email: &str, grade: u8) -> String {
    json!({ "email": email, "name": "Ana", "metadata": { "ano": grade } }).to_string()
}
