//! Quiz attempts: the in-memory session state machine and the service that
//! loads, finalizes and closes it.

mod progress;
mod session;
mod summary;
mod workflow;

pub use progress::QuizProgress;
pub use session::{Advance, ExitDecision, LoadFailure, QuizPhase, QuizSession};
pub use summary::{QuizSummary, SummaryRow};
pub use workflow::QuizSessionService;
