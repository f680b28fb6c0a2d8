mod answer;
mod ids;
mod page;
mod question;
mod result;
mod session;
mod subject;
mod user;

pub use answer::{PersistedAnswer, QuestionSlot, SessionAnswers};
pub use ids::{ParseIdError, QuestionId, ResultId};
pub use page::Page;
pub use question::{Question, QuestionError};
pub use result::{QuestionResult, ResultDetail, ResultReport, ResultSummary};
pub use session::SessionKey;
pub use subject::{Grade, GradeError, Subject, SubjectError};
pub use user::{AccessToken, Credentials, User, UserMetadata};
