use std::collections::BTreeMap;
use std::fmt;

use quiz_core::model::{
    Grade, PersistedAnswer, Question, QuestionResult, ResultReport, SessionKey, Subject,
};

use super::progress::QuizProgress;
use super::summary::QuizSummary;
use crate::error::QuizError;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Why a session could not get past loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The server answered with an empty question set.
    NoQuestions,
    /// The fetch itself failed; carries the user-facing message.
    Remote(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    Answering,
    Confirming,
    Submitting,
    Summary,
    Error(LoadFailure),
}

impl QuizPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            QuizPhase::Loading => "loading",
            QuizPhase::Answering => "answering",
            QuizPhase::Confirming => "confirming",
            QuizPhase::Submitting => "submitting",
            QuizPhase::Summary => "summary",
            QuizPhase::Error(_) => "error",
        }
    }
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a successful `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this index.
    Moved(usize),
    /// Last question answered; the session now awaits confirmation.
    ReadyToConfirm,
}

/// What leaving the quiz screen right now would mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// Nothing to lose; leave immediately.
    Leave,
    /// Progress would be discarded; ask the user first.
    ConfirmAbort,
    /// A submission is in flight; ignore the request.
    Blocked,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt.
///
/// Holds the fetched questions, the position, and the tentative answer per
/// question. Answers stay in memory until finalization writes them to the
/// session's answer bucket.
pub struct QuizSession {
    subject: Subject,
    grade: Grade,
    email: String,
    key: Option<SessionKey>,
    questions: Vec<Question>,
    current: usize,
    answers: BTreeMap<usize, String>,
    phase: QuizPhase,
    summary: Option<QuizSummary>,
}

impl QuizSession {
    /// A session in `loading`, before its questions arrive.
    #[must_use]
    pub fn new(subject: Subject, grade: Grade, email: impl Into<String>) -> Self {
        Self {
            subject,
            grade,
            email: email.into(),
            key: None,
            questions: Vec::new(),
            current: 0,
            answers: BTreeMap::new(),
            phase: QuizPhase::Loading,
            summary: None,
        }
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Key of the answer bucket, assigned once questions are loaded.
    #[must_use]
    pub fn session_key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    /// Tentative answer for the question at `index`.
    #[must_use]
    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    /// Tentative answer for the current question.
    #[must_use]
    pub fn selected_answer(&self) -> Option<&str> {
        self.answer_for(self.current)
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            position: self.current + 1,
            total: self.questions.len(),
            answered: self.answers.len(),
            selected: self.selected_answer().map(str::to_owned),
        }
    }

    /// Summary shown after a successful submission.
    #[must_use]
    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    /// Record `key` as the answer to the current question, replacing any
    /// previous choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` outside `answering` and
    /// `QuizError::UnknownAlternative` if `key` is not one of the question's
    /// alternatives.
    pub fn select_answer(&mut self, key: &str) -> Result<(), QuizError> {
        self.expect_phase(&QuizPhase::Answering)?;
        let question = self
            .current_question()
            .ok_or(QuizError::InvalidPhase("answering"))?;
        if !question.has_alternative(key) {
            return Err(QuizError::UnknownAlternative(key.to_owned()));
        }
        self.answers.insert(self.current, key.to_owned());
        Ok(())
    }

    /// Advance to the next question, or to confirmation from the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoAnswerSelected` (state unchanged) when the
    /// current question has no answer, `QuizError::InvalidPhase` outside
    /// `answering`.
    pub fn next(&mut self) -> Result<Advance, QuizError> {
        self.expect_phase(&QuizPhase::Answering)?;
        if self.selected_answer().is_none() {
            return Err(QuizError::NoAnswerSelected);
        }
        if self.is_last() {
            self.phase = QuizPhase::Confirming;
            return Ok(Advance::ReadyToConfirm);
        }
        self.current += 1;
        Ok(Advance::Moved(self.current))
    }

    /// Step back one question; a no-op on the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` outside `answering`.
    pub fn previous(&mut self) -> Result<usize, QuizError> {
        self.expect_phase(&QuizPhase::Answering)?;
        self.current = self.current.saturating_sub(1);
        Ok(self.current)
    }

    /// Leave the confirmation step and return to the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidPhase` outside `confirming`.
    pub fn cancel_confirmation(&mut self) -> Result<(), QuizError> {
        self.expect_phase(&QuizPhase::Confirming)?;
        self.phase = QuizPhase::Answering;
        Ok(())
    }

    #[must_use]
    pub fn exit_decision(&self) -> ExitDecision {
        match self.phase {
            QuizPhase::Summary | QuizPhase::Error(_) => ExitDecision::Leave,
            QuizPhase::Submitting => ExitDecision::Blocked,
            QuizPhase::Loading | QuizPhase::Answering | QuizPhase::Confirming => {
                ExitDecision::ConfirmAbort
            }
        }
    }

    /// Scored report over every question; unanswered ones carry an empty
    /// answer and count as incorrect.
    #[must_use]
    pub fn build_report(&self) -> ResultReport {
        let answers = self
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                QuestionResult::new(
                    question.id().clone(),
                    question.code(),
                    self.answer_for(index).unwrap_or_default(),
                    question.answer_key(),
                )
            })
            .collect();
        ResultReport::new(self.subject, self.grade, self.email.clone(), answers)
    }

    /// Records to persist at finalization, ascending by question index.
    /// Unanswered questions are skipped.
    pub(crate) fn answers_to_persist(&self) -> Vec<(usize, PersistedAnswer)> {
        self.answers
            .iter()
            .filter_map(|(index, given)| {
                self.questions.get(*index).map(|question| {
                    (
                        *index,
                        PersistedAnswer::new(
                            question.statement(),
                            question.answer_key(),
                            given.clone(),
                        ),
                    )
                })
            })
            .collect()
    }

    pub(crate) fn load(
        &mut self,
        questions: Vec<Question>,
        key: SessionKey,
    ) -> Result<(), QuizError> {
        self.expect_phase(&QuizPhase::Loading)?;
        if questions.is_empty() {
            self.phase = QuizPhase::Error(LoadFailure::NoQuestions);
            return Err(QuizError::NoQuestions);
        }
        self.questions = questions;
        self.key = Some(key);
        self.current = 0;
        self.phase = QuizPhase::Answering;
        Ok(())
    }

    pub(crate) fn fail_loading(&mut self, message: String) {
        if self.phase == QuizPhase::Loading {
            self.phase = QuizPhase::Error(LoadFailure::Remote(message));
        }
    }

    /// `confirming → submitting`; hands back the bucket key.
    pub(crate) fn begin_submit(&mut self) -> Result<SessionKey, QuizError> {
        match self.phase {
            QuizPhase::Confirming => {}
            QuizPhase::Submitting => return Err(QuizError::SubmissionInFlight),
            ref other => return Err(QuizError::InvalidPhase(other.name())),
        }
        let key = self.key.clone().ok_or(QuizError::InvalidPhase("loading"))?;
        self.phase = QuizPhase::Submitting;
        Ok(key)
    }

    pub(crate) fn submit_failed(&mut self) {
        if self.phase == QuizPhase::Submitting {
            self.phase = QuizPhase::Confirming;
        }
    }

    pub(crate) fn complete(&mut self, summary: QuizSummary) -> &QuizSummary {
        self.phase = QuizPhase::Summary;
        self.summary.insert(summary)
    }

    /// Jump to confirmation regardless of unanswered questions.
    #[cfg(test)]
    pub(crate) fn force_confirming(&mut self) {
        self.phase = QuizPhase::Confirming;
    }

    fn expect_phase(&self, expected: &QuizPhase) -> Result<(), QuizError> {
        if &self.phase == expected {
            Ok(())
        } else {
            Err(QuizError::InvalidPhase(self.phase.name()))
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("subject", &self.subject)
            .field("grade", &self.grade)
            .field("key", &self.key)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answers.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
