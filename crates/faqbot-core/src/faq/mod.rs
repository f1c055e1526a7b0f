//! FAQ store: static question/answer records loaded once at startup, plus the
//! fuzzy matcher that resolves free text against them.
//!
//! The source file is a JSON array:
//!
//! ```json
//! [
//!   { "questions": ["what time does school start", "school start time"], "answer": "8:00 AM" }
//! ]
//! ```

mod index;
mod matcher;
mod similarity;

pub use index::QuestionIndex;
pub use matcher::{MatchOutcome, Matcher, FALLBACK_ANSWER, SIMILARITY_THRESHOLD};
pub use similarity::similarity_ratio;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One canonical answer with the phrasings that should resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub questions: Vec<String>,
    pub answer: String,
}

impl FaqEntry {
    pub fn new<Q, S>(questions: Q, answer: impl Into<String>) -> Self
    where
        Q: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            questions: questions.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }

    /// Checks the entry invariants: at least one non-blank question and a non-blank answer.
    fn validate(&self) -> Result<(), &'static str> {
        if self.questions.is_empty() {
            return Err("entry has no questions");
        }
        if self.questions.iter().any(|q| q.trim().is_empty()) {
            return Err("entry has a blank question");
        }
        if self.answer.trim().is_empty() {
            return Err("entry has an empty answer");
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FaqError {
    #[error("{} not found!", .0.display())]
    Missing(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid FAQ entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: &'static str },
}

/// Loads and validates the FAQ entries at `path`. A missing file is reported as
/// [`FaqError::Missing`] so callers can halt before serving.
pub fn load_faq<P: AsRef<Path>>(path: P) -> Result<Vec<FaqEntry>, FaqError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FaqError::Missing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| FaqError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<FaqEntry> = serde_json::from_str(&raw).map_err(|source| FaqError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    for (index, entry) in entries.iter().enumerate() {
        entry
            .validate()
            .map_err(|reason| FaqError::InvalidEntry { index, reason })?;
    }
    tracing::info!(
        target: "faqbot::faq",
        path = %path.display(),
        entries = entries.len(),
        "Loaded {} FAQ entries from {}",
        entries.len(),
        path.display()
    );
    Ok(entries)
}
