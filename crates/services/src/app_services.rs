use std::sync::Arc;

use storage::{SessionAnswerStore, Storage};
use tracing::info;

use crate::Clock;
use crate::api::{HttpQuizApi, QuizApi};
use crate::auth::AuthSession;
use crate::config::ApiConfig;
use crate::error::AppServicesError;
use crate::quiz::QuizSessionService;
use crate::results_service::ResultsService;

/// Assembles the app-facing services over one store and one API client.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    api: Arc<dyn QuizApi>,
    quiz: Arc<QuizSessionService>,
    results: Arc<ResultsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client
    /// construction fails.
    pub async fn new_sqlite(
        db_url: &str,
        api: &ApiConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::new(api)?);
        info!(db_url, "services ready");
        Ok(Self::with_parts(storage, api, clock))
    }

    /// Wire services from already-built parts.
    #[must_use]
    pub fn with_parts(storage: Storage, api: Arc<dyn QuizApi>, clock: Clock) -> Self {
        let answers = SessionAnswerStore::new(Arc::clone(&storage.kv), clock);
        let quiz = Arc::new(QuizSessionService::new(Arc::clone(&api), answers));
        let results = Arc::new(ResultsService::new(Arc::clone(&api)));
        Self {
            storage,
            api,
            quiz,
            results,
        }
    }

    /// Restore the persisted auth session and sync the API token with it.
    pub async fn auth_session(&self) -> AuthSession {
        AuthSession::init(Arc::clone(&self.storage.kv), Arc::clone(&self.api)).await
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}
