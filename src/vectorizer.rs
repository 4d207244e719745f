// src/vectorizer.rs
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use ndarray::{Array1, Array2};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TopicConfig;
use crate::error::{DiaryError, Result};

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static regex"))
}

/// Term-count vectorizer with a pruned uni/bigram vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    /// Term to column, columns in lexicographic term order
    vocabulary: BTreeMap<String, usize>,
    stop_words: BTreeSet<String>,
    ngram_range: (usize, usize),
}

pub struct CountVectorizerBuilder {
    documents: Vec<String>,
    stop_words: BTreeSet<String>,
    ngram_range: (usize, usize),
    min_df: f64,
    max_df: f64,
}

impl CountVectorizerBuilder {
    pub fn new(config: &TopicConfig) -> Self {
        Self {
            documents: Vec::new(),
            stop_words: config.stop_words(),
            ngram_range: config.ngram_range,
            min_df: config.min_df,
            max_df: config.max_df,
        }
    }

    pub fn add(&mut self, document: &str) {
        self.documents.push(document.to_string());
    }

    /// Builds the vocabulary and the document-term matrix of the added
    /// documents. `scope` names the corpus in errors.
    pub fn build(self, scope: &str) -> Result<(CountVectorizer, Array2<f64>)> {
        let n_docs = self.documents.len();
        if n_docs == 0 {
            return Err(DiaryError::model_fit(scope, "no documents to vectorize"));
        }

        let analyzed: Vec<Vec<String>> = self
            .documents
            .iter()
            .map(|doc| analyze(doc, &self.stop_words, self.ngram_range))
            .collect();

        // Count document frequency
        let mut doc_count: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            let seen: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in seen {
                *doc_count.entry(term).or_insert(0) += 1;
            }
        }
        if doc_count.is_empty() {
            return Err(DiaryError::model_fit(
                scope,
                "empty vocabulary; the documents only contain stop words",
            ));
        }

        let min_count = self.min_df * n_docs as f64;
        let max_count = self.max_df * n_docs as f64;
        let kept: BTreeSet<&str> = doc_count
            .iter()
            .filter(|&(_, &df)| df as f64 >= min_count && df as f64 <= max_count)
            .map(|(&term, _)| term)
            .collect();
        debug!(
            "Vectorizer for {} - docs={}, candidate_terms={}, kept_terms={}",
            scope,
            n_docs,
            doc_count.len(),
            kept.len()
        );
        if kept.is_empty() {
            return Err(DiaryError::model_fit(
                scope,
                format!(
                    "no terms remain after pruning to document frequency [{}, {}] of {} documents",
                    self.min_df, self.max_df, n_docs
                ),
            ));
        }

        let vocabulary: BTreeMap<String, usize> = kept
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.to_string(), i))
            .collect();
        let vectorizer = CountVectorizer {
            vocabulary,
            stop_words: self.stop_words,
            ngram_range: self.ngram_range,
        };

        let mut matrix = Array2::zeros((n_docs, vectorizer.len()));
        for (row, terms) in analyzed.iter().enumerate() {
            vectorizer.accumulate(terms, matrix.row_mut(row));
        }
        Ok((vectorizer, matrix))
    }
}

/// Lowercases, keeps tokens of two or more word characters, drops stop
/// words, then emits n-grams over the remaining tokens.
fn analyze(document: &str, stop_words: &BTreeSet<String>, ngram_range: (usize, usize)) -> Vec<String> {
    let lower = document.to_lowercase();
    let tokens: Vec<&str> = token_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !stop_words.contains(*t))
        .collect();

    let (min_n, max_n) = ngram_range;
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n == 0 || n > tokens.len() {
            continue;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

impl CountVectorizer {
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Terms ordered by column.
    pub fn feature_names(&self) -> Vec<&str> {
        // BTreeMap order is the column order
        self.vocabulary.keys().map(String::as_str).collect()
    }

    fn accumulate(&self, terms: &[String], mut row: ndarray::ArrayViewMut1<f64>) {
        for term in terms {
            if let Some(&col) = self.vocabulary.get(term) {
                row[col] += 1.0;
            }
        }
    }

    /// Counts of vocabulary terms in `document`; out-of-vocabulary terms
    /// are ignored.
    pub fn transform_one(&self, document: &str) -> Array1<f64> {
        let terms = analyze(document, &self.stop_words, self.ngram_range);
        let mut row = Array1::zeros(self.len());
        self.accumulate(&terms, row.view_mut());
        row
    }
}
