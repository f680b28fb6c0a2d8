use std::fmt;

/// Correct-answer count over a question total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    correct: usize,
    total: usize,
}

impl Score {
    #[must_use]
    pub fn new(correct: usize, total: usize) -> Self {
        Self { correct, total }
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// `round(100 * correct / total)`, halves rounding up; `0` for an empty total.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let scaled = (200 * self.correct + self.total) / (2 * self.total);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_percentage(f64::from(self.percentage()))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.correct, self.total)
    }
}

/// Coarse performance band used when listing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub const GOOD_FROM: f64 = 70.0;
    pub const FAIR_FROM: f64 = 50.0;

    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= Self::GOOD_FROM {
            ScoreBand::Good
        } else if percentage >= Self::FAIR_FROM {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Poor => "needs practice",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
