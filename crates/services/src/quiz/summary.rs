use quiz_core::Score;
use quiz_core::model::{PersistedAnswer, QuestionSlot, SessionAnswers};

/// One row of the post-submission summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub slot: QuestionSlot,
    pub answer: PersistedAnswer,
}

impl SummaryRow {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.answer.is_correct()
    }
}

/// What the user sees after finishing a quiz.
///
/// Built from the persisted answer bucket, not from in-memory answers, so
/// answers that failed to persist are absent here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    rows: Vec<SummaryRow>,
    score: Score,
}

impl QuizSummary {
    /// Score is `correct rows / question_count`; correctness is recomputed
    /// from each stored pair.
    #[must_use]
    pub fn from_persisted(answers: SessionAnswers, question_count: usize) -> Self {
        let rows: Vec<SummaryRow> = answers
            .into_iter()
            .map(|(slot, answer)| SummaryRow { slot, answer })
            .collect();
        let correct = rows.iter().filter(|row| row.is_correct()).count();
        Self {
            rows,
            score: Score::new(correct, question_count),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.score.percentage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_still_count_against_total() {
        let mut answers = SessionAnswers::new();
        answers.insert(
            QuestionSlot::from_index(0),
            PersistedAnswer::new("2 + 2?", "A", "A"),
        );
        let summary = QuizSummary::from_persisted(answers, 3);
        assert_eq!(summary.rows().len(), 1);
        assert_eq!(summary.score(), Score::new(1, 3));
        assert_eq!(summary.percentage(), 33);
    }

    #[test]
    fn rows_follow_question_number() {
        let mut answers = SessionAnswers::new();
        for index in [10, 1, 0] {
            answers.insert(
                QuestionSlot::from_index(index),
                PersistedAnswer::new("x", "A", "B"),
            );
        }
        let summary = QuizSummary::from_persisted(answers, 11);
        let numbers: Vec<usize> = summary.rows().iter().map(|r| r.slot.number()).collect();
        assert_eq!(numbers, vec![1, 2, 11]);
        assert_eq!(summary.percentage(), 0);
    }
}
