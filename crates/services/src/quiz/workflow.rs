use std::sync::Arc;

use quiz_core::model::Subject;
use storage::SessionAnswerStore;
use tracing::{debug, error, info, warn};

use super::session::{QuizPhase, QuizSession};
use super::summary::QuizSummary;
use crate::api::{QuestionQuery, QuizApi};
use crate::auth::AuthSession;
use crate::error::QuizError;

/// Drives a `QuizSession` through the remote API and the answer store.
#[derive(Clone)]
pub struct QuizSessionService {
    api: Arc<dyn QuizApi>,
    answers: SessionAnswerStore,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>, answers: SessionAnswerStore) -> Self {
        Self { api, answers }
    }

    #[must_use]
    pub fn answer_store(&self) -> &SessionAnswerStore {
        &self.answers
    }

    /// Create a session for `subject` from the signed-in profile.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MissingProfile` when nobody is signed in or the
    /// profile carries no grade.
    pub fn begin(&self, subject: Subject, auth: &AuthSession) -> Result<QuizSession, QuizError> {
        let user = auth.user().ok_or(QuizError::MissingProfile("email"))?;
        let grade = user.grade().ok_or(QuizError::MissingProfile("grade"))?;
        Ok(QuizSession::new(subject, grade, user.email.clone()))
    }

    /// Fetch the first page of questions and move the session to `answering`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty set and
    /// `QuizError::Remote` when the fetch fails; either way the session ends
    /// up in the error phase.
    pub async fn load_questions(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        let query = QuestionQuery::first_page(session.subject(), session.grade());
        let page = match self.api.fetch_questions(&query).await {
            Ok(page) => page,
            Err(err) => {
                warn!(subject = %session.subject(), error = %err, "failed to load questions");
                session.fail_loading(err.message());
                return Err(err.into());
            }
        };

        let key = self
            .answers
            .new_session_key(session.subject(), session.grade(), session.email());
        let questions = page.into_items();
        debug!(key = %key, count = questions.len(), "questions loaded");
        session.load(questions, key)
    }

    /// `begin` followed by `load_questions`.
    ///
    /// # Errors
    ///
    /// Same as `begin` and `load_questions`.
    pub async fn start(
        &self,
        subject: Subject,
        auth: &AuthSession,
    ) -> Result<QuizSession, QuizError> {
        let mut session = self.begin(subject, auth)?;
        self.load_questions(&mut session).await?;
        Ok(session)
    }

    /// Persist every answer, submit the scored report, and build the summary
    /// from what was persisted.
    ///
    /// Saves run one at a time in question order. A failed save is logged
    /// and skipped. A failed submission returns the session to `confirming`
    /// with its answers intact, so calling this again retries.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` outside `confirming`,
    /// `QuizError::SubmissionInFlight` while submitting, and
    /// `QuizError::Remote` when the submission fails.
    pub async fn finalize<'s>(
        &self,
        session: &'s mut QuizSession,
    ) -> Result<&'s QuizSummary, QuizError> {
        let key = session.begin_submit()?;

        let mut unsaved = 0_usize;
        for (index, answer) in session.answers_to_persist() {
            if !self.answers.save(&key, index, answer).await {
                unsaved += 1;
            }
        }
        if unsaved > 0 {
            warn!(key = %key, unsaved, "answers missing from local store; summary will omit them");
        }

        let report = session.build_report();
        if let Err(err) = self.api.submit_result(&report).await {
            error!(key = %key, error = %err, "result submission failed");
            session.submit_failed();
            return Err(err.into());
        }
        info!(
            subject = %report.subject,
            correct = report.correct,
            total = report.total,
            "result submitted"
        );

        let persisted = self.answers.get_all(&key).await;
        let summary = QuizSummary::from_persisted(persisted, session.questions().len());
        Ok(session.complete(summary))
    }

    /// Discard the session's answer bucket; used on exit from the summary and
    /// on a confirmed abort.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::SubmissionInFlight` while a submission is running.
    pub async fn close(&self, session: &QuizSession) -> Result<(), QuizError> {
        if session.phase() == &QuizPhase::Submitting {
            return Err(QuizError::SubmissionInFlight);
        }
        if let Some(key) = session.session_key() {
            self.answers.clear(key).await;
            debug!(key = %key, phase = %session.phase(), "quiz session closed");
        }
        Ok(())
    }
}
