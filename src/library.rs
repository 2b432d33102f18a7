//! Standard issue library search.
//!
//! A library entry matches when at least one word of its title is close to
//! one of the search terms (similarity ratio above [`MATCH_THRESHOLD`]). The
//! score is the sum of those ratios divided by the number of terms, so titles
//! matching several terms rank first.

use serde::Serialize;

use crate::model::StandardIssue;

/// Minimum word/term similarity (0..1) counted as a match.
pub const MATCH_THRESHOLD: f64 = 0.80;

/// A library entry that matched a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub issue: StandardIssue,
    /// Average match ratio over all search terms (0..1).
    pub score: f64,
    /// Title words that matched, in title order.
    pub keywords: Vec<String>,
}

impl SearchHit {
    /// Score as a percentage, e.g. `"92.31 %"`.
    #[must_use]
    pub fn score_label(&self) -> String {
        format!("{:.2} %", self.score * 100.0)
    }

    /// Title with matched words passed through `mark`.
    pub fn highlighted_title<F>(&self, mark: F) -> String
    where
        F: Fn(&str) -> String,
    {
        self.issue
            .title
            .split(' ')
            .map(|word| {
                if self.keywords.iter().any(|k| k == word) {
                    mark(word)
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn similarity(a: &str, b: &str) -> f64 {
    rapidfuzz::fuzz::ratio(a.chars(), b.chars())
}

/// Search `library` for entries whose titles match `terms`.
///
/// Results are sorted by score, best first; ties keep library order. Empty
/// `terms` yields no hits.
#[must_use]
pub fn search(library: &[StandardIssue], terms: &[String]) -> Vec<SearchHit> {
    let terms: Vec<&str> = terms
        .iter()
        .flat_map(|t| t.split_whitespace())
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = library
        .iter()
        .filter_map(|issue| {
            let mut total = 0.0;
            let mut keywords = Vec::new();

            for word in issue.title.split_whitespace() {
                for term in &terms {
                    let ratio = similarity(term, word);
                    if ratio > MATCH_THRESHOLD {
                        total += ratio;
                        keywords.push(word.to_string());
                    }
                }
            }

            (!keywords.is_empty()).then(|| SearchHit {
                issue: issue.clone(),
                score: total / terms.len() as f64,
                keywords,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}
