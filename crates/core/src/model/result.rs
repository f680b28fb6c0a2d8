use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Grade, QuestionId, ResultId, Subject};
use crate::score::{Score, ScoreBand};

//
// ─── PER-QUESTION RESULT ───────────────────────────────────────────────────────
//

/// Outcome of one question inside a result.
///
/// Correctness is not stored: it is derived from `given_answer` and
/// `answer_key` every time, including when decoding a server payload whose
/// `acertou` flag disagrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuestionResultWire", into = "QuestionResultWire")]
pub struct QuestionResult {
    question_id: QuestionId,
    code: String,
    given_answer: String,
    answer_key: String,
}

impl QuestionResult {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        code: impl Into<String>,
        given_answer: impl Into<String>,
        answer_key: impl Into<String>,
    ) -> Self {
        Self {
            question_id,
            code: code.into(),
            given_answer: given_answer.into(),
            answer_key: answer_key.into(),
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Answer chosen by the student; empty when the question was left blank.
    #[must_use]
    pub fn given_answer(&self) -> &str {
        &self.given_answer
    }

    #[must_use]
    pub fn answer_key(&self) -> &str {
        &self.answer_key
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.given_answer == self.answer_key
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionResultWire {
    questao_id: QuestionId,
    codigo: String,
    resposta_dada: String,
    gabarito: String,
    #[serde(default)]
    acertou: bool,
}

impl From<QuestionResultWire> for QuestionResult {
    fn from(wire: QuestionResultWire) -> Self {
        Self::new(wire.questao_id, wire.codigo, wire.resposta_dada, wire.gabarito)
    }
}

impl From<QuestionResult> for QuestionResultWire {
    fn from(result: QuestionResult) -> Self {
        let acertou = result.is_correct();
        Self {
            questao_id: result.question_id,
            codigo: result.code,
            resposta_dada: result.given_answer,
            gabarito: result.answer_key,
            acertou,
        }
    }
}

fn score_of(answers: &[QuestionResult]) -> Score {
    let correct = answers.iter().filter(|a| a.is_correct()).count();
    Score::new(correct, answers.len())
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// Scored payload submitted when a quiz attempt is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultReport {
    #[serde(rename = "disciplina")]
    pub subject: Subject,
    #[serde(rename = "ano")]
    pub grade: Grade,
    pub email: String,
    #[serde(rename = "respostas")]
    pub answers: Vec<QuestionResult>,
    #[serde(rename = "pontuacao")]
    pub correct: usize,
    #[serde(rename = "total_questoes")]
    pub total: usize,
}

impl ResultReport {
    /// Builds the report, deriving the score from the per-question results.
    #[must_use]
    pub fn new(
        subject: Subject,
        grade: Grade,
        email: impl Into<String>,
        answers: Vec<QuestionResult>,
    ) -> Self {
        let score = score_of(&answers);
        Self {
            subject,
            grade,
            email: email.into(),
            answers,
            correct: score.correct(),
            total: score.total(),
        }
    }

    #[must_use]
    pub fn score(&self) -> Score {
        Score::new(self.correct, self.total)
    }
}

//
// ─── HISTORY ───────────────────────────────────────────────────────────────────
//

/// A past result as listed under "my results".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    #[serde(alias = "_id")]
    pub id: ResultId,
    pub email: String,
    #[serde(rename = "disciplina")]
    pub subject: Subject,
    #[serde(rename = "ano")]
    pub grade: Grade,
    #[serde(rename = "respostas", default)]
    pub answers: Vec<QuestionResult>,
    #[serde(rename = "pontuacao")]
    pub correct: u32,
    #[serde(rename = "total_questoes")]
    pub total: u32,
    #[serde(rename = "percentual_acerto")]
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultSummary {
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percentage(self.percentage)
    }
}

/// Full detail of one past result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDetail {
    #[serde(alias = "_id")]
    pub id: ResultId,
    #[serde(rename = "disciplina")]
    pub subject: Subject,
    #[serde(rename = "ano")]
    pub grade: Grade,
    #[serde(rename = "respostas")]
    pub answers: Vec<QuestionResult>,
    #[serde(rename = "pontuacao")]
    pub correct: u32,
    #[serde(rename = "total_questoes")]
    pub total: u32,
    #[serde(rename = "percentual_acerto")]
    pub percentage: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultDetail {
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percentage(self.percentage)
    }

    /// Score recomputed from the per-question answers.
    #[must_use]
    pub fn recomputed_score(&self) -> Score {
        score_of(&self.answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(given: &str, key: &str) -> QuestionResult {
        QuestionResult::new(QuestionId::new("q"), "EF05", given, key)
    }

    #[test]
    fn report_counts_correct_answers() {
        let report = ResultReport::new(
            Subject::Math,
            Grade::new(5).unwrap(),
            "aluno@escola.br",
            vec![result("A", "A"), result("C", "B"), result("", "D")],
        );
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 3);
    }

    #[test]
    fn report_serializes_with_wire_names() {
        let report = ResultReport::new(
            Subject::Math,
            Grade::new(5).unwrap(),
            "aluno@escola.br",
            vec![result("B", "B")],
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["disciplina"], "MA");
        assert_eq!(value["ano"], 5);
        assert_eq!(value["pontuacao"], 1);
        assert_eq!(value["total_questoes"], 1);
        assert_eq!(value["respostas"][0]["acertou"], true);
        assert_eq!(value["respostas"][0]["resposta_dada"], "B");
    }

    #[test]
    fn decoded_correctness_ignores_stale_flag() {
        let decoded: QuestionResult = serde_json::from_str(
            r#"{"questao_id":"q","codigo":"c","resposta_dada":"A","gabarito":"B","acertou":true}"#,
        )
        .unwrap();
        assert!(!decoded.is_correct());
    }

    #[test]
    fn detail_decodes_and_recomputes() {
        let detail: ResultDetail = serde_json::from_str(
            r#"{
                "id": "r1", "disciplina": "CI", "ano": 4,
                "respostas": [
                    {"questao_id":"q1","codigo":"c1","resposta_dada":"A","gabarito":"A","acertou":true},
                    {"questao_id":"q2","codigo":"c2","resposta_dada":"B","gabarito":"C","acertou":false}
                ],
                "pontuacao": 1, "total_questoes": 2, "percentual_acerto": 50.0,
                "created_at": "2024-05-02T10:00:00Z", "updated_at": "2024-05-02T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(detail.recomputed_score().correct(), 1);
        assert_eq!(detail.band(), ScoreBand::Fair);
    }
}
