//! Past results: paginated history and per-result detail with question review.

use std::sync::Arc;

use tracing::debug;

use quiz_core::model::{
    Page, QuestionId, QuestionResult, ResultDetail, ResultId, ResultSummary,
};

use crate::api::QuizApi;
use crate::error::ResultsError;

/// One alternative of a reviewed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedAlternative {
    pub key: String,
    pub text: String,
    pub is_given: bool,
    pub is_correct: bool,
}

/// A past answer shown against the full question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub code: String,
    pub statement: String,
    pub image_url: Option<String>,
    pub alternatives: Vec<ReviewedAlternative>,
    pub given_answer: String,
    pub answer_key: String,
}

impl QuestionReview {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.given_answer == self.answer_key
    }
}

#[derive(Clone)]
pub struct ResultsService {
    api: Arc<dyn QuizApi>,
}

impl ResultsService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `ResultsError::Remote` when the request fails.
    pub async fn list_page(
        &self,
        page: u32,
        email: &str,
    ) -> Result<Page<ResultSummary>, ResultsError> {
        let page = self.api.list_results(page.max(1), email).await?;
        debug!(page = page.page, count = page.data.len(), has_next = page.has_next, "results page loaded");
        Ok(page)
    }

    /// # Errors
    ///
    /// Returns `ResultsError::NotFound` for an unknown id.
    pub async fn detail(&self, id: &ResultId) -> Result<ResultDetail, ResultsError> {
        Ok(self.api.fetch_result(id).await?)
    }

    /// Fetch the question behind `answer` and mark the given and correct
    /// alternatives.
    ///
    /// The answer key comes from the stored result, so a question edited
    /// since the attempt is still judged by what was recorded.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::NotFound` when the question no longer exists.
    pub async fn review_question(
        &self,
        answer: &QuestionResult,
    ) -> Result<QuestionReview, ResultsError> {
        let question = self.api.fetch_question(answer.question_id()).await?;
        let alternatives = question
            .alternatives()
            .iter()
            .map(|(key, text)| ReviewedAlternative {
                key: key.clone(),
                text: text.clone(),
                is_given: key == answer.given_answer(),
                is_correct: key == answer.answer_key(),
            })
            .collect();
        Ok(QuestionReview {
            question_id: answer.question_id().clone(),
            code: answer.code().to_owned(),
            statement: question.statement().to_owned(),
            image_url: question.image_url().map(str::to_owned),
            alternatives,
            given_answer: answer.given_answer().to_owned(),
            answer_key: answer.answer_key().to_owned(),
        })
    }
}

/// Accumulated "my results" list with load-more pagination.
#[derive(Debug, Clone, Default)]
pub struct ResultHistory {
    email: String,
    items: Vec<ResultSummary>,
    page: u32,
    total: u64,
    has_next: bool,
}

impl ResultHistory {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ResultSummary] {
        &self.items
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_next
    }

    /// Total reported by the server, across all pages.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Drop what was loaded and fetch page 1 again.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError` when the request fails; the list is left empty.
    pub async fn load_first(&mut self, service: &ResultsService) -> Result<(), ResultsError> {
        self.load_from(service, 1).await
    }

    /// Drop what was loaded and start over at `page`.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError` when the request fails; the list is left empty.
    pub async fn load_from(
        &mut self,
        service: &ResultsService,
        page: u32,
    ) -> Result<(), ResultsError> {
        self.items.clear();
        self.page = 0;
        self.has_next = false;
        self.total = 0;
        self.load_page(service, page.max(1)).await
    }

    /// Append the next page. Returns `false` without a request when the last
    /// page is already loaded.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError` when the request fails; loaded items are kept.
    pub async fn load_more(&mut self, service: &ResultsService) -> Result<bool, ResultsError> {
        if !self.has_next {
            return Ok(false);
        }
        self.load_page(service, self.page + 1).await?;
        Ok(true)
    }

    async fn load_page(&mut self, service: &ResultsService, page: u32) -> Result<(), ResultsError> {
        let loaded = service.list_page(page, &self.email).await?;
        self.page = loaded.page.max(page);
        self.total = loaded.total;
        self.has_next = loaded.has_next;
        self.items.extend(loaded.into_items());
        Ok(())
    }
}
