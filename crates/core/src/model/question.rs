use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Grade, QuestionId, Subject};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has neither `id` nor `_id`")]
    MissingId,

    #[error("question {0} has no alternatives")]
    NoAlternatives(String),

    #[error("answer key {key} is not one of the alternatives of question {question}")]
    UnknownAnswerKey { question: String, key: String },
}

/// A multiple-choice question as served by the remote API.
///
/// Immutable once fetched. Alternatives are keyed by letter (`A`..`D`) and
/// iterate in key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionWire", into = "QuestionWire")]
pub struct Question {
    id: QuestionId,
    code: String,
    subject: Subject,
    grade: Grade,
    statement: String,
    alternatives: BTreeMap<String, String>,
    answer_key: String,
    image_url: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Question {
    /// Build a question, checking that the answer key is one of the alternatives.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoAlternatives` or `QuestionError::UnknownAnswerKey`.
    pub fn new(
        id: QuestionId,
        code: impl Into<String>,
        subject: Subject,
        grade: Grade,
        statement: impl Into<String>,
        alternatives: BTreeMap<String, String>,
        answer_key: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let answer_key = answer_key.into();
        if alternatives.is_empty() {
            return Err(QuestionError::NoAlternatives(id.to_string()));
        }
        if !alternatives.contains_key(&answer_key) {
            return Err(QuestionError::UnknownAnswerKey {
                question: id.to_string(),
                key: answer_key,
            });
        }
        Ok(Self {
            id,
            code: code.into(),
            subject,
            grade,
            statement: statement.into(),
            alternatives,
            answer_key,
            image_url: None,
            created_at: None,
            updated_at: None,
        })
    }

    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Short human-facing code (codigo).
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Question text (enunciado).
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn alternatives(&self) -> &BTreeMap<String, String> {
        &self.alternatives
    }

    #[must_use]
    pub fn has_alternative(&self, key: &str) -> bool {
        self.alternatives.contains_key(key)
    }

    /// Correct alternative key (gabarito).
    #[must_use]
    pub fn answer_key(&self) -> &str {
        &self.answer_key
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

//
// ─── WIRE SHAPE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    mongo_id: Option<String>,
    disciplina: Subject,
    ano: Grade,
    codigo: String,
    questao: QuestionBodyWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionBodyWire {
    enunciado: String,
    alternativas: BTreeMap<String, String>,
    gabarito: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl TryFrom<QuestionWire> for Question {
    type Error = QuestionError;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.mongo_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(QuestionError::MissingId)?;

        let mut question = Question::new(
            QuestionId::new(id),
            wire.codigo,
            wire.disciplina,
            wire.ano,
            wire.questao.enunciado,
            wire.questao.alternativas,
            wire.questao.gabarito,
        )?;
        question.image_url = wire.questao.url;
        question.created_at = wire.created_at;
        question.updated_at = wire.updated_at;
        Ok(question)
    }
}

impl From<Question> for QuestionWire {
    fn from(question: Question) -> Self {
        Self {
            id: Some(question.id.as_str().to_owned()),
            mongo_id: None,
            disciplina: question.subject,
            ano: question.grade,
            codigo: question.code,
            questao: QuestionBodyWire {
                enunciado: question.statement,
                alternativas: question.alternatives,
                gabarito: question.answer_key,
                url: question.image_url,
            },
            created_at: question.created_at,
            updated_at: question.updated_at,
        }
    }
}
