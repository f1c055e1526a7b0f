//! Resolves free-text questions to canned answers.

use super::index::QuestionIndex;
use super::similarity::QueryProfile;
use super::FaqEntry;
use serde::Serialize;

/// Minimum similarity a variant needs to be accepted.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Answer given when no variant reaches [`SIMILARITY_THRESHOLD`].
pub const FALLBACK_ANSWER: &str =
    "Sorry, I don't know that yet! Please contact the school office for more details.";

/// Result of resolving one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched {
        /// Winning lowercased question variant.
        question: String,
        answer: String,
        score: f64,
    },
    Fallback,
}

impl MatchOutcome {
    /// Text to show the user.
    pub fn answer(&self) -> &str {
        match self {
            Self::Matched { answer, .. } => answer,
            Self::Fallback => FALLBACK_ANSWER,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Top-1 fuzzy matcher over an immutable [`QuestionIndex`].
#[derive(Debug, Clone)]
pub struct Matcher {
    index: QuestionIndex,
}

impl Matcher {
    pub fn new(index: QuestionIndex) -> Self {
        Self { index }
    }

    pub fn from_entries(entries: &[FaqEntry]) -> Self {
        Self::new(QuestionIndex::from_entries(entries))
    }

    pub fn index(&self) -> &QuestionIndex {
        &self.index
    }

    /// Finds the variant most similar to the lowercased `query`. Scores below
    /// the threshold are rejected; equal scores keep the earlier variant.
    pub fn resolve(&self, query: &str) -> MatchOutcome {
        let profile = QueryProfile::new(&query.to_lowercase());

        let mut best: Option<(usize, f64)> = None;
        for (pos, variant) in self.index.variants().iter().enumerate() {
            // A candidate must reach the threshold and strictly beat the current best.
            let floor = best.map(|(_, s)| s);
            let rejects = |bound: f64| bound < SIMILARITY_THRESHOLD || floor.is_some_and(|f| bound <= f);
            if rejects(profile.real_quick_ratio(&variant.chars)) || rejects(profile.quick_ratio(&variant.chars)) {
                continue;
            }
            let score = profile.ratio(&variant.chars);
            if !rejects(score) {
                best = Some((pos, score));
            }
        }

        let Some((pos, score)) = best else {
            tracing::debug!(target: "faqbot::faq", query = query, "No FAQ variant reached the threshold");
            return MatchOutcome::Fallback;
        };
        let question = self.index.variants()[pos].text.clone();
        match self.index.answer_for(&question) {
            Some(answer) => MatchOutcome::Matched {
                answer: answer.to_string(),
                question,
                score,
            },
            None => MatchOutcome::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school_faq() -> Matcher {
        Matcher::from_entries(&[
            FaqEntry::new(["what time does school start", "school start time"], "8:00 AM"),
            FaqEntry::new(["when is the library open", "library hours"], "7:30 AM to 4:00 PM"),
        ])
    }

    #[test]
    fn exact_variant_scores_one_regardless_of_case() {
        let outcome = school_faq().resolve("School Start TIME");
        match outcome {
            MatchOutcome::Matched { question, answer, score } => {
                assert_eq!(question, "school start time");
                assert_eq!(answer, "8:00 AM");
                assert_eq!(score, 1.0);
            }
            MatchOutcome::Fallback => panic!("expected a match"),
        }
    }

    #[test]
    fn misspelled_query_still_resolves() {
        let outcome = school_faq().resolve("whta time does shcool start");
        assert_eq!(outcome.answer(), "8:00 AM");
        assert!(matches!(
            outcome,
            MatchOutcome::Matched { ref question, .. } if question == "what time does school start"
        ));
    }

    #[test]
    fn unrelated_query_gets_the_fallback() {
        let matcher = school_faq();
        for q in ["hello", "zzzz", "?"] {
            let outcome = matcher.resolve(q);
            assert_eq!(outcome, MatchOutcome::Fallback, "query {:?}", q);
            assert_eq!(outcome.answer(), FALLBACK_ANSWER);
        }
    }

    #[test]
    fn partially_overlapping_query_clears_the_threshold() {
        // 24 of the 56 combined characters fall in matching blocks.
        let matcher = Matcher::from_entries(&[FaqEntry::new(
            ["what time does school start", "school start time"],
            "8:00 AM",
        )]);
        let outcome = matcher.resolve("what is the capital of France");
        match outcome {
            MatchOutcome::Matched { question, score, .. } => {
                assert_eq!(question, "what time does school start");
                assert!((score - 24.0 / 56.0).abs() < 1e-9);
            }
            MatchOutcome::Fallback => panic!("expected a match"),
        }
    }

    #[test]
    fn empty_query_does_not_panic() {
        assert_eq!(school_faq().resolve(""), MatchOutcome::Fallback);
    }

    #[test]
    fn empty_index_always_falls_back() {
        let matcher = Matcher::from_entries(&[]);
        assert!(matcher.index().is_empty());
        assert_eq!(matcher.resolve("anything"), MatchOutcome::Fallback);
    }

    #[test]
    fn ties_go_to_the_first_variant() {
        // Both variants score 0.5 against "abcd".
        let matcher = Matcher::from_entries(&[
            FaqEntry::new(["abxy"], "first"),
            FaqEntry::new(["abzw"], "second"),
        ]);
        for _ in 0..3 {
            let outcome = matcher.resolve("abcd");
            assert_eq!(outcome.answer(), "first");
        }
    }

    #[test]
    fn duplicate_question_answers_with_last_entry() {
        let matcher = Matcher::from_entries(&[
            FaqEntry::new(["bus times"], "first"),
            FaqEntry::new(["Bus Times"], "second"),
        ]);
        assert_eq!(matcher.resolve("bus times").answer(), "second");
    }

    #[test]
    fn no_punctuation_stripping() {
        let matcher = Matcher::from_entries(&[FaqEntry::new(["a"], "letter")]);
        // "a!" vs "a": 2*1/3 = 0.67, still a match but not exact.
        match matcher.resolve("A!") {
            MatchOutcome::Matched { score, .. } => assert!((score - 2.0 / 3.0).abs() < 1e-9),
            MatchOutcome::Fallback => panic!("expected a match"),
        }
    }
}
