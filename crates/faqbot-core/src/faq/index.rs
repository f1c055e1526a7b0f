use super::FaqEntry;
use std::collections::HashMap;

/// One lowercased question phrasing, pre-split into characters for matching.
#[derive(Debug, Clone)]
pub(crate) struct Variant {
    pub(crate) text: String,
    pub(crate) chars: Vec<char>,
}

/// Flattened, lowercased view of the FAQ entries.
///
/// Variants keep file order (duplicates included) since match ties go to the
/// first one encountered. The answer lookup is keyed by lowercased question; when
/// two entries share a question the later entry's answer wins.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    variants: Vec<Variant>,
    answers: HashMap<String, String>,
    entry_count: usize,
}

impl QuestionIndex {
    pub fn from_entries(entries: &[FaqEntry]) -> Self {
        let mut variants = Vec::new();
        let mut answers = HashMap::new();
        for entry in entries {
            for question in &entry.questions {
                let text = question.to_lowercase();
                variants.push(Variant {
                    chars: text.chars().collect(),
                    text: text.clone(),
                });
                answers.insert(text, entry.answer.clone());
            }
        }
        Self {
            variants,
            answers,
            entry_count: entries.len(),
        }
    }

    /// Number of FAQ entries the index was built from.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Number of question variants, duplicates included.
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Answer for an already-lowercased question.
    pub fn answer_for(&self, lowered: &str) -> Option<&str> {
        self.answers.get(lowered).map(String::as_str)
    }

    pub(crate) fn variants(&self) -> &[Variant] {
        &self.variants
    }
}
