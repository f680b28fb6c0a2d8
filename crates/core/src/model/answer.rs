use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Sub-key of a persisted answer inside a session bucket: `questao_{n}` with
/// `n` one-based.
///
/// Ordered numerically so `questao_10` sorts after `questao_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionSlot(usize);

impl QuestionSlot {
    const PREFIX: &'static str = "questao_";

    /// Slot for a zero-based question index.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// One-based question number.
    #[must_use]
    pub fn number(self) -> usize {
        self.0
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 - 1
    }

    fn parse(raw: &str) -> Option<Self> {
        raw.strip_prefix(Self::PREFIX)?
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(Self)
    }
}

impl fmt::Display for QuestionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl Serialize for QuestionSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuestionSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        QuestionSlot::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid question slot: {raw}")))
    }
}

/// A finalized answer as written to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAnswer {
    #[serde(rename = "enunciado")]
    pub statement: String,
    #[serde(rename = "gabarito")]
    pub answer_key: String,
    #[serde(rename = "resposta_dada")]
    pub given_answer: String,
}

impl PersistedAnswer {
    #[must_use]
    pub fn new(
        statement: impl Into<String>,
        answer_key: impl Into<String>,
        given_answer: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            answer_key: answer_key.into(),
            given_answer: given_answer.into(),
        }
    }

    /// Always recomputed from the two keys; never cached.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.given_answer == self.answer_key
    }
}

/// All persisted answers of one session bucket, ordered by question number.
pub type SessionAnswers = BTreeMap<QuestionSlot, PersistedAnswer>;
