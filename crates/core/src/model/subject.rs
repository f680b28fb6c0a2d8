use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown subject code: {0}")]
pub struct SubjectError(pub String);

/// Curriculum subject (disciplina), identified on the wire by a short code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "LP")]
    Portuguese,
    #[serde(rename = "MA")]
    Math,
    #[serde(rename = "CI")]
    Science,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Portuguese, Subject::Math, Subject::Science];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Subject::Portuguese => "LP",
            Subject::Math => "MA",
            Subject::Science => "CI",
        }
    }

    /// Display name in the students' language.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Subject::Portuguese => "Português",
            Subject::Math => "Matemática",
            Subject::Science => "Ciências",
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Subject::Portuguese => "📚",
            Subject::Math => "🔢",
            Subject::Science => "🔬",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subject {
    type Err = SubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| SubjectError(code.to_owned()))
    }
}

//
// ─── GRADE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradeError {
    #[error("grade must be between {min} and {max}, got {0}", min = Grade::MIN, max = Grade::MAX)]
    OutOfRange(i64),

    #[error("grade is not a number: {0}")]
    NotANumber(String),
}

/// School year (ano) of the primary-education cycle.
///
/// Questions carry it as a string while results and profiles carry a number,
/// so deserialization accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    /// # Errors
    ///
    /// Returns `GradeError::OutOfRange` outside `1..=9`.
    pub fn new(value: i64) -> Result<Self, GradeError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(GradeError::OutOfRange(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let value = raw
            .parse::<i64>()
            .map_err(|_| GradeError::NotANumber(raw.to_owned()))?;
        Self::new(value)
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Grade::new(n),
            Raw::Text(s) => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}
