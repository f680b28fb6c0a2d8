//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;

/// Failures of a remote API call, already classified for presentation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request failed with status {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// User-facing message: the server's own message when it sent one,
    /// otherwise a connection error description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ApiError::Timeout => "connection error: request timed out".to_owned(),
            ApiError::Connection(reason) => format!("connection error: {reason}"),
            ApiError::Unauthorized => "session expired, please log in again".to_owned(),
            ApiError::NotFound(message) | ApiError::Status { message, .. } => message.clone(),
            ApiError::Decode(_) => "unexpected response from server".to_owned(),
            ApiError::Url(err) => format!("connection error: {err}"),
        }
    }

    /// A 401 invalidates the whole signed-in session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Connection(err.to_string())
        }
    }
}

/// Errors emitted by the quiz session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("select an answer before continuing")]
    NoAnswerSelected,
    #[error("{0} is not an alternative of this question")]
    UnknownAlternative(String),
    #[error("no questions found")]
    NoQuestions,
    #[error("signed-in profile is missing {0}")]
    MissingProfile(&'static str),
    #[error("not allowed while {0}")]
    InvalidPhase(&'static str),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("{}", .0.message())]
    Remote(#[from] ApiError),
}

impl QuizError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, QuizError::Remote(err) if err.is_unauthorized())
    }
}

/// Errors emitted by `AuthSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("no access token received")]
    MissingToken,
    #[error("invalid user profile: {0}")]
    InvalidProfile(String),
    #[error("{}", .0.message())]
    Remote(#[from] ApiError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsError {
    #[error("{0}")]
    NotFound(String),
    #[error("{}", .0.message())]
    Remote(ApiError),
}

impl From<ApiError> for ResultsError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(message) => ResultsError::NotFound(message),
            other => ResultsError::Remote(other),
        }
    }
}

impl ResultsError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ResultsError::Remote(err) if err.is_unauthorized())
    }
}

/// Invalid API configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API url {raw}: {source}")]
    InvalidUrl {
        raw: String,
        source: url::ParseError,
    },
    #[error("invalid timeout seconds: {0}")]
    InvalidTimeout(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_surfaced_verbatim() {
        let err = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            message: "Questões não encontradas".into(),
        };
        assert_eq!(err.message(), "Questões não encontradas");
        assert_eq!(QuizError::from(err).to_string(), "Questões não encontradas");
    }

    #[test]
    fn not_found_becomes_results_not_found() {
        let err = ResultsError::from(ApiError::NotFound("Resultado não encontrado".into()));
        assert!(matches!(err, ResultsError::NotFound(ref m) if m == "Resultado não encontrado"));
    }

    #[test]
    fn unauthorized_is_detected_through_wrappers() {
        assert!(QuizError::from(ApiError::Unauthorized).is_unauthorized());
        assert!(ResultsError::from(ApiError::Unauthorized).is_unauthorized());
        assert!(!QuizError::NoQuestions.is_unauthorized());
    }
}
