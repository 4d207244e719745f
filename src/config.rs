//! Pipeline parameters and the manual override tables.
//!
//! Both are plain JSON files. Every key of [`PipelineConfig`] has a default,
//! so a config file only needs to list what it changes.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiaryError, Result};
use crate::stopwords::{stop_word_set, DIARY_STOP_WORDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub clustering: ClusteringConfig,
    pub topics: TopicConfig,
    pub nouns: NounConfig,
    pub recommend: RecommendConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringConfig::default(),
            topics: TopicConfig::default(),
            nouns: NounConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub n_clusters: usize,
    pub seed: u64,
    pub max_iterations: u64,
    pub tolerance: f64,
    /// Independent k-means restarts; the lowest-inertia run wins
    pub n_runs: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            seed: 20,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub n_topics: usize,
    pub seed: u64,
    /// Minimum document frequency, as a proportion of the documents
    pub min_df: f64,
    /// Maximum document frequency, as a proportion of the documents
    pub max_df: f64,
    pub ngram_range: (usize, usize),
    pub max_iterations: usize,
    pub tolerance: f64,
    pub top_terms: usize,
    /// Added to the standard English stop words
    pub extra_stop_words: Vec<String>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            n_topics: 5,
            seed: 19,
            min_df: 0.1,
            max_df: 0.9,
            ngram_range: (1, 2),
            max_iterations: 200,
            tolerance: 1e-4,
            top_terms: 10,
            extra_stop_words: DIARY_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl TopicConfig {
    pub fn stop_words(&self) -> BTreeSet<String> {
        stop_word_set(&self.extra_stop_words)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaggerKind {
    /// Built-in word lists and suffix rules
    Lexicon,
    /// Transformer model from the default `bert-pos` feature
    Bert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NounConfig {
    pub tagger: TaggerKind,
}

impl Default for NounConfig {
    fn default() -> Self {
        Self {
            tagger: TaggerKind::Bert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub count: usize,
    pub url_base: String,
    /// Run query text through the same noun filter as the training diaries
    pub filter_query_nouns: bool,
    pub min_age: u32,
    pub max_age: u32,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            count: 3,
            url_base: "https://www.refinery29.com".to_string(),
            filter_query_nouns: true,
            min_age: 18,
            max_age: 100,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clustering.n_clusters == 0 {
            return Err(DiaryError::config("clustering.n_clusters must be at least 1"));
        }
        if self.topics.n_topics == 0 {
            return Err(DiaryError::config("topics.n_topics must be at least 1"));
        }
        let t = &self.topics;
        if !(0.0..=1.0).contains(&t.min_df) || !(0.0..=1.0).contains(&t.max_df) {
            return Err(DiaryError::config(format!(
                "min_df ({}) and max_df ({}) must be proportions in [0, 1]",
                t.min_df, t.max_df
            )));
        }
        if t.min_df > t.max_df {
            return Err(DiaryError::config(format!(
                "min_df ({}) is larger than max_df ({})",
                t.min_df, t.max_df
            )));
        }
        let (lo, hi) = t.ngram_range;
        if lo == 0 || lo > hi {
            return Err(DiaryError::config(format!(
                "invalid ngram_range ({}, {})",
                lo, hi
            )));
        }
        if self.recommend.count == 0 {
            return Err(DiaryError::config("recommend.count must be at least 1"));
        }
        if self.recommend.min_age > self.recommend.max_age {
            return Err(DiaryError::config("recommend.min_age is above recommend.max_age"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOverride<T> {
    pub row: usize,
    pub value: T,
}

/// Hand-curated corrections for rows the cleaner cannot fix on its own.
///
/// Salary rows are positions in the raw table. Location, nomad and
/// international rows are positions after salary deduplication reindexes
/// the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideTables {
    pub salary: Vec<RowOverride<f64>>,
    pub location: Vec<RowOverride<String>>,
    pub nomad: Vec<usize>,
    pub international: Vec<usize>,
}

impl OverrideTables {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let tables: OverrideTables = serde_json::from_str(&raw)?;
        debug!(
            "Loaded overrides from {}: salary={}, location={}, nomad={}, international={}",
            path.display(),
            tables.salary.len(),
            tables.location.len(),
            tables.nomad.len(),
            tables.international.len()
        );
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_published_model() {
        let config = PipelineConfig::default();
        assert_eq!(config.clustering.n_clusters, 5);
        assert_eq!(config.clustering.seed, 20);
        assert_eq!(config.topics.n_topics, 5);
        assert_eq!(config.topics.seed, 19);
        assert_eq!(config.topics.ngram_range, (1, 2));
        assert_eq!(config.recommend.count, 3);
        assert_eq!(config.nouns.tagger, TaggerKind::Bert);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lexicon_tagger_is_opt_in() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"nouns": {"tagger": "lexicon"}}"#).unwrap();
        assert_eq!(config.nouns.tagger, TaggerKind::Lexicon);
        assert_eq!(PipelineConfig::default().nouns.tagger, TaggerKind::Bert);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"topics": {"n_topics": 8}}"#).unwrap();
        assert_eq!(config.topics.n_topics, 8);
        assert_eq!(config.topics.min_df, 0.1);
        assert_eq!(config.clustering.n_clusters, 5);
    }

    #[test]
    fn test_validate_rejects_inverted_df_bounds() {
        let mut config = PipelineConfig::default();
        config.topics.min_df = 0.95;
        assert!(matches!(config.validate(), Err(DiaryError::Config(_))));
    }

    #[test]
    fn test_override_file_parses() {
        let raw = r#"{
            "salary": [{"row": 3, "value": 145500}],
            "location": [{"row": 19, "value": "New York, NY"}],
            "nomad": [96],
            "international": [0, 15]
        }"#;
        let tables: OverrideTables = serde_json::from_str(raw).unwrap();
        assert_eq!(tables.salary[0].value, 145500.0);
        assert_eq!(tables.location[0].value, "New York, NY");
        assert_eq!(tables.international, vec![0, 15]);
    }

    #[test]
    fn test_shipped_override_file_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/overrides.json");
        let tables = OverrideTables::load(&path).unwrap();
        assert!(!tables.salary.is_empty());
        assert!(tables.nomad.contains(&96));
    }
}
