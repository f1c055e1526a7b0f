//! Ratcliff/Obershelp sequence similarity.
//!
//! The ratio is `2 * M / T`, where `T` is the combined length of both sequences
//! and `M` is the number of elements covered by the matching blocks: the longest
//! common contiguous block, then recursively the longest blocks to its left and
//! to its right. Sequences are compared as Unicode scalar values.
//!
//! The query side is indexed once ([`QueryProfile`]) and compared against many
//! candidates. Queries of 200 characters or more drop "popular" characters
//! (more than `len / 100 + 1` occurrences) from the index; such characters can
//! still extend a block but never seed one.

use std::collections::HashMap;

/// Query length from which popular characters are dropped from the index.
const POPULAR_MIN_LEN: usize = 200;

/// Returns the similarity of `a` and `b` in `[0, 1]`. Two empty strings score 1.0.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let candidate: Vec<char> = a.chars().collect();
    QueryProfile::new(b).ratio(&candidate)
}

fn ratio_of(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}

/// Indexed form of a query, reusable across candidates.
#[derive(Debug, Clone)]
pub(crate) struct QueryProfile {
    chars: Vec<char>,
    /// Character -> ascending positions in `chars` (popular characters removed).
    b2j: HashMap<char, Vec<usize>>,
    /// Character multiset, for the cheap upper bound.
    counts: HashMap<char, usize>,
}

impl QueryProfile {
    pub(crate) fn new(query: &str) -> Self {
        let chars: Vec<char> = query.chars().collect();
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in chars.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        let counts = b2j.iter().map(|(c, js)| (*c, js.len())).collect();

        let n = chars.len();
        if n >= POPULAR_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, js| js.len() <= ntest);
        }

        Self { chars, b2j, counts }
    }

    /// Length-only upper bound on [`Self::ratio`].
    pub(crate) fn real_quick_ratio(&self, candidate: &[char]) -> f64 {
        let (la, lb) = (candidate.len(), self.chars.len());
        ratio_of(la.min(lb), la + lb)
    }

    /// Multiset-intersection upper bound on [`Self::ratio`].
    pub(crate) fn quick_ratio(&self, candidate: &[char]) -> f64 {
        let mut avail: HashMap<char, usize> = HashMap::new();
        let mut matches = 0;
        for c in candidate {
            let left = avail
                .entry(*c)
                .or_insert_with(|| self.counts.get(c).copied().unwrap_or(0));
            if *left > 0 {
                *left -= 1;
                matches += 1;
            }
        }
        ratio_of(matches, candidate.len() + self.chars.len())
    }

    /// Exact Ratcliff/Obershelp ratio of `candidate` against this query.
    pub(crate) fn ratio(&self, candidate: &[char]) -> f64 {
        let matches: usize = self.matching_blocks(candidate).iter().map(|m| m.size).sum();
        ratio_of(matches, candidate.len() + self.chars.len())
    }

    fn matching_blocks(&self, a: &[char]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut queue = vec![(0, a.len(), 0, self.chars.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.longest_match(a, alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            if alo < m.a && blo < m.b {
                queue.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
            blocks.push(m);
        }
        blocks.sort_by_key(|m| (m.a, m.b));
        blocks
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges. Among
    /// equally long blocks the one starting earliest in `a`, then in `b`, wins.
    fn longest_match(&self, a: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let b = &self.chars;
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0);

        // j2len[j] = length of the block ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let k = prev + 1;
                    next.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters never seed a block; grow the best one across them.
        while besti > alo && bestj > blo && a[besti - 1] == b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi && bestj + bestsize < bhi && a[besti + bestsize] == b[bestj + bestsize] {
            bestsize += 1;
        }

        Block { a: besti, b: bestj, size: bestsize }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn identical_strings_score_one() {
        assert!(close(similarity_ratio("school start time", "school start time"), 1.0));
        assert!(close(similarity_ratio("", ""), 1.0));
    }

    #[test]
    fn empty_query_scores_zero_against_text() {
        assert!(close(similarity_ratio("what time does school start", ""), 0.0));
        assert!(close(similarity_ratio("", "hello"), 0.0));
    }

    #[test]
    fn known_ratios() {
        // 25 of 27 characters line up despite the two transpositions.
        assert!(close(
            similarity_ratio("what time does school start", "whta time does shcool start"),
            25.0 / 27.0
        ));
        assert!(close(similarity_ratio("abxcd", "abcd"), 8.0 / 9.0));
        assert!(close(similarity_ratio("when is the library open", "when does the library open"), 0.92));
        assert!(close(
            similarity_ratio("what time does school start", "what is the capital of france"),
            24.0 / 56.0
        ));
        assert!(close(similarity_ratio("school start time", "what is the capital of france"), 12.0 / 46.0));
        assert!(close(similarity_ratio("school start time", "hello"), 4.0 / 22.0));
    }

    #[test]
    fn candidate_is_the_first_sequence() {
        let r = similarity_ratio("school start time", "what time does school start");
        assert!(close(r, 24.0 / 44.0));
        assert!((0.0..=1.0).contains(&r));
    }

    #[test]
    fn popular_characters_in_long_queries_do_not_seed_blocks() {
        // 'a' is popular in a 250-char query, so the lone 'a' in the candidate
        // cannot start a block and nothing else matches.
        let query = "a".repeat(250);
        assert!(close(similarity_ratio("xay", &query), 0.0));
        // Below the length cut-off the same character does match.
        let query = "a".repeat(199);
        assert!(close(similarity_ratio("xay", &query), 2.0 / 202.0));
    }

    #[test]
    fn popular_characters_still_extend_blocks() {
        let query = "a".repeat(250);
        assert!(close(similarity_ratio("aaaa", &query), 8.0 / 254.0));
    }

    #[test]
    fn upper_bounds_never_undershoot() {
        let profile = QueryProfile::new("whta time does shcool start");
        for cand in ["what time does school start", "school start time", "", "zzz"] {
            let chars: Vec<char> = cand.chars().collect();
            let exact = profile.ratio(&chars);
            assert!(profile.quick_ratio(&chars) >= exact);
            assert!(profile.real_quick_ratio(&chars) >= profile.quick_ratio(&chars));
        }
    }

    #[test]
    fn compares_unicode_scalars() {
        assert!(close(similarity_ratio("café", "cafe"), 6.0 / 8.0));
    }
}
