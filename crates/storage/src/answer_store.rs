//! Session-scoped persistence of finalized quiz answers.
//!
//! Every operation here is best-effort: storage failures are logged and
//! swallowed so the owning quiz flow never aborts because local persistence
//! is unavailable. A failed save means the summary read back later will be
//! missing that answer.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use quiz_core::Clock;
use quiz_core::model::{Grade, PersistedAnswer, QuestionSlot, SessionAnswers, SessionKey, Subject};
use tracing::{debug, warn};

use crate::repository::{KeyValueStore, StorageError};

#[derive(Clone)]
pub struct SessionAnswerStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
    last_key_millis: Arc<AtomicI64>,
}

impl SessionAnswerStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self {
            kv,
            clock,
            last_key_millis: Arc::new(AtomicI64::new(i64::MIN)),
        }
    }

    /// Generate the key for a new session bucket.
    ///
    /// The timestamp component is strictly increasing per store, so two keys
    /// requested within the same millisecond still differ.
    #[must_use]
    pub fn new_session_key(&self, subject: Subject, grade: Grade, email: &str) -> SessionKey {
        let now = self.clock.epoch_millis();
        let mut last = self.last_key_millis.load(Ordering::Relaxed);
        let millis = loop {
            let candidate = if now > last { now } else { last + 1 };
            match self.last_key_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(current) => last = current,
            }
        };
        SessionKey::compose(subject, grade, email, millis)
    }

    /// Merge `answer` into the bucket under `questao_{index + 1}`.
    ///
    /// Returns `false` when the write did not reach storage.
    pub async fn save(&self, key: &SessionKey, index: usize, answer: PersistedAnswer) -> bool {
        let slot = QuestionSlot::from_index(index);
        match self.try_save(key, slot, answer).await {
            Ok(()) => {
                debug!(session = %key, %slot, "answer persisted");
                true
            }
            Err(err) => {
                warn!(session = %key, %slot, error = %err, "failed to persist answer");
                false
            }
        }
    }

    /// All persisted answers of the bucket; empty if missing or unreadable.
    pub async fn get_all(&self, key: &SessionKey) -> SessionAnswers {
        match self.try_load(key).await {
            Ok(answers) => answers,
            Err(err) => {
                warn!(session = %key, error = %err, "failed to read session answers");
                SessionAnswers::new()
            }
        }
    }

    /// Remove the whole bucket. No-op when it does not exist.
    pub async fn clear(&self, key: &SessionKey) {
        if let Err(err) = self.kv.remove(key.as_str()).await {
            warn!(session = %key, error = %err, "failed to clear session answers");
        } else {
            debug!(session = %key, "session answers cleared");
        }
    }

    async fn try_save(
        &self,
        key: &SessionKey,
        slot: QuestionSlot,
        answer: PersistedAnswer,
    ) -> Result<(), StorageError> {
        let mut answers = self.try_load(key).await?;
        answers.insert(slot, answer);
        let encoded = serde_json::to_string(&answers)?;
        self.kv.set(key.as_str(), &encoded).await
    }

    async fn try_load(&self, key: &SessionKey) -> Result<SessionAnswers, StorageError> {
        match self.kv.get(key.as_str()).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(SessionAnswers::new()),
        }
    }
}
