use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Grade, Subject};

/// Storage key of one quiz attempt's answer bucket:
/// `{subject}_{grade}_{email}_{epochMillis}`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    #[must_use]
    pub fn compose(subject: Subject, grade: Grade, email: &str, epoch_millis: i64) -> Self {
        Self(format!("{}_{}_{}_{}", subject.code(), grade, email, epoch_millis))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing timestamp component, if the key is well-formed.
    #[must_use]
    pub fn epoch_millis(&self) -> Option<i64> {
        self.0.rsplit_once('_')?.1.parse().ok()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.0)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_original_key_layout() {
        let key = SessionKey::compose(
            Subject::Math,
            Grade::new(5).unwrap(),
            "ana_souza@escola.br",
            1_700_000_000_123,
        );
        assert_eq!(key.as_str(), "MA_5_ana_souza@escola.br_1700000000123");
        assert_eq!(key.epoch_millis(), Some(1_700_000_000_123));
    }
}
