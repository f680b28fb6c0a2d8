/// Position within a quiz attempt, for rendering a progress header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    /// One-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// Alternative chosen for the current question, if any.
    pub selected: Option<String>,
}

impl QuizProgress {
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }
}
