#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth;
pub mod config;
pub mod error;
pub mod quiz;
pub mod results_service;

pub use quiz_core::Clock;

pub use api::{HttpQuizApi, LoginResponse, QuestionQuery, QuizApi};
pub use app_services::AppServices;
pub use auth::AuthSession;
pub use config::ApiConfig;
pub use error::{ApiError, AppServicesError, AuthError, ConfigError, QuizError, ResultsError};
pub use quiz::{
    Advance, ExitDecision, LoadFailure, QuizPhase, QuizProgress, QuizSession, QuizSessionService,
    QuizSummary, SummaryRow,
};
pub use results_service::{QuestionReview, ResultHistory, ResultsService, ReviewedAlternative};
