//! Unigram/bigram TF-IDF feature transformer.
//!
//! Tokenization lowercases the text and keeps alphanumeric runs of two or
//! more characters; adjacent token pairs form bigram terms. The vocabulary
//! is capped at `max_features` terms selected by total corpus frequency
//! (ties broken lexicographically), so refitting the same corpus always
//! yields the identical transformer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// A sparse feature row: `(feature index, weight)` pairs in ascending
/// index order.
pub type SparseRow = Vec<(usize, f64)>;

/// Fitted TF-IDF transformer: vocabulary with per-term smoothed inverse
/// document frequencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit a transformer on the given documents, keeping at most
    /// `max_features` terms.
    pub fn fit(documents: &[&str], max_features: usize) -> Self {
        let mut corpus_count: HashMap<String, u64> = HashMap::new();
        let mut document_frequency: HashMap<String, u64> = HashMap::new();

        for document in documents {
            let terms = document_terms(document);
            let mut seen = BTreeSet::new();
            for term in terms {
                *corpus_count.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *document_frequency.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, u64)> = corpus_count.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        // Feature indices are assigned in lexicographic term order.
        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let total_documents = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(terms.len());
        for (index, term) in terms.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or(0) as f64;
            idf.push(((1.0 + total_documents) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    /// Number of features a transformed row spans.
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Transform one document into an L2-normalized sparse TF-IDF row.
    /// Terms outside the vocabulary are ignored.
    pub fn transform(&self, document: &str) -> SparseRow {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in document_terms(document) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();

        let norm = row.iter().map(|(_, value)| value * value).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in &mut row {
                *value /= norm;
            }
        }
        row
    }

    /// Transform a batch of documents.
    pub fn transform_all(&self, documents: &[&str]) -> Vec<SparseRow> {
        documents.iter().map(|doc| self.transform(doc)).collect()
    }
}

/// Unigram and bigram terms of one document, in occurrence order.
fn document_terms(document: &str) -> Vec<String> {
    let tokens = tokenize(document);
    let mut terms = Vec::with_capacity(tokens.len().saturating_mul(2));
    for window in tokens.windows(2) {
        terms.push(format!("{} {}", window[0], window[1]));
    }
    terms.extend(tokens);
    terms
}

/// Lowercased alphanumeric runs of length two or more.
fn tokenize(document: &str) -> Vec<String> {
    document
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 4] = [
        "great product, works great",
        "terrible product, broke fast",
        "great value and great quality",
        "terrible quality, terrible support",
    ];

    #[test]
    fn vocabulary_never_exceeds_max_features() {
        let vectorizer = TfidfVectorizer::fit(&CORPUS, 5);
        assert!(vectorizer.n_features() <= 5);

        let unbounded = TfidfVectorizer::fit(&CORPUS, 10_000);
        assert!(unbounded.n_features() > 5);
    }

    #[test]
    fn refitting_identical_corpus_yields_identical_transformer() {
        let first = TfidfVectorizer::fit(&CORPUS, 8);
        let second = TfidfVectorizer::fit(&CORPUS, 8);
        assert_eq!(first, second);
    }

    #[test]
    fn captures_bigram_terms() {
        let vectorizer = TfidfVectorizer::fit(&CORPUS, 10_000);
        assert!(vectorizer.vocabulary.contains_key("terrible quality"));
        assert!(vectorizer.vocabulary.contains_key("great product"));
    }

    #[test]
    fn ignores_single_character_tokens() {
        let vectorizer = TfidfVectorizer::fit(&["a b c real tokens"], 10_000);
        assert!(!vectorizer.vocabulary.contains_key("a"));
        assert!(vectorizer.vocabulary.contains_key("real"));
    }

    #[test]
    fn transformed_rows_are_l2_normalized() {
        let vectorizer = TfidfVectorizer::fit(&CORPUS, 10_000);
        let row = vectorizer.transform(CORPUS[0]);
        assert!(!row.is_empty());

        let norm: f64 = row.iter().map(|(_, value)| value * value).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_vocabulary_document_transforms_to_empty_row() {
        let vectorizer = TfidfVectorizer::fit(&CORPUS, 10_000);
        let row = vectorizer.transform("zzz unseen-words only!!");
        assert!(row.is_empty());
    }

    #[test]
    fn higher_corpus_frequency_wins_the_feature_cap() {
        // "great" appears four times, more than any bigram.
        let vectorizer = TfidfVectorizer::fit(&CORPUS, 2);
        assert!(vectorizer.vocabulary.contains_key("great"));
    }
}
