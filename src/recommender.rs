// src/recommender.rs
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifacts::ModelBundle;
use crate::error::{DiaryError, Result};
use crate::nouns::{extract_nouns, PosTagger};
use crate::text::clean_text;
use crate::utils::cosine_distance;

/// What a reader tells us about themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub age: u32,
    pub salary: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub rank: usize,
    pub story_title: String,
    pub url: String,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Recommendation {
    Ranked { cluster: usize, picks: Vec<Pick> },
    /// The query text shares nothing with the cluster's vocabulary
    InsufficientText { cluster: usize, reason: String },
}

impl Recommendation {
    pub fn cluster(&self) -> usize {
        match self {
            Recommendation::Ranked { cluster, .. } => *cluster,
            Recommendation::InsufficientText { cluster, .. } => *cluster,
        }
    }
}

/// Row indices of `rows` ordered by cosine distance to `target`, closest
/// first. Equal distances keep row order.
pub fn rank_by_distance(target: ArrayView1<f64>, rows: ArrayView2<f64>) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = rows
        .axis_iter(Axis(0))
        .map(|row| cosine_distance(target, row))
        .enumerate()
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

pub fn story_url(base: &str, suffix: &str) -> String {
    let base = base.trim_end_matches('/');
    if suffix.starts_with('/') {
        format!("{}{}", base, suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

pub struct Recommender<'a> {
    bundle: &'a ModelBundle,
    tagger: &'a dyn PosTagger,
}

impl<'a> Recommender<'a> {
    pub fn new(bundle: &'a ModelBundle, tagger: &'a dyn PosTagger) -> Self {
        Self { bundle, tagger }
    }

    fn validate(&self, query: &Query) -> Result<()> {
        let limits = &self.bundle.config.recommend;
        if query.age < limits.min_age || query.age > limits.max_age {
            return Err(DiaryError::invalid_query(format!(
                "age {} is outside {}..={}",
                query.age, limits.min_age, limits.max_age
            )));
        }
        if !query.salary.is_finite() || query.salary < 0.0 {
            return Err(DiaryError::invalid_query(format!(
                "salary {} must be a non-negative number",
                query.salary
            )));
        }
        Ok(())
    }

    /// Text the cluster vectorizer sees for this query.
    fn prepare_text(&self, text: &str) -> Result<String> {
        let cleaned = clean_text(text);
        if self.bundle.config.recommend.filter_query_nouns {
            extract_nouns(self.tagger, &cleaned)
        } else {
            Ok(cleaned)
        }
    }

    pub fn recommend(&self, query: &Query) -> Result<Recommendation> {
        self.validate(query)?;
        let settings = &self.bundle.config.recommend;

        let cluster = self
            .bundle
            .clustering
            .predict(query.age as f64, query.salary)?;
        let model = self.bundle.cluster(cluster)?;
        debug!(
            "Query age={} salary={} assigned to cluster {}",
            query.age, query.salary, cluster
        );

        let text = self.prepare_text(&query.text)?;
        if text.trim().is_empty() {
            return Ok(Recommendation::InsufficientText {
                cluster,
                reason: "no usable words left after cleaning".to_string(),
            });
        }
        let weights = match model.project(&text)? {
            Some(weights) => weights,
            None => {
                return Ok(Recommendation::InsufficientText {
                    cluster,
                    reason: format!("no words in common with the {} vocabulary", model.scope()),
                })
            }
        };
        if weights.iter().all(|&w| w == 0.0) {
            return Ok(Recommendation::InsufficientText {
                cluster,
                reason: "text does not load on any topic".to_string(),
            });
        }

        let picks = rank_by_distance(weights.view(), model.doc_topic().view())
            .into_iter()
            .take(settings.count)
            .enumerate()
            .map(|(i, (row, distance))| {
                let story_title = model.story_titles()[row].clone();
                Pick {
                    rank: i + 1,
                    url: story_url(&settings.url_base, &story_title),
                    story_title,
                    distance,
                }
            })
            .collect();
        Ok(Recommendation::Ranked { cluster, picks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_ties_keep_corpus_order() {
        let target = array![1.0, 0.0];
        let rows = array![[0.0, 1.0], [2.0, 0.0], [1.0, 0.0], [0.0, 0.0], [1.0, 1.0]];
        let ranked = rank_by_distance(target.view(), rows.view());
        let order: Vec<usize> = ranked.iter().map(|&(i, _)| i).collect();
        // rows 1 and 2 are both at distance 0, rows 0 and 3 at distance 1
        assert_eq!(order, vec![1, 2, 4, 0, 3]);
        assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_story_url_joins_with_one_slash() {
        let base = "https://www.refinery29.com";
        assert_eq!(
            story_url(base, "/en-us/money-diary-nyc"),
            "https://www.refinery29.com/en-us/money-diary-nyc"
        );
        assert_eq!(
            story_url(base, "en-us/money-diary-nyc"),
            "https://www.refinery29.com/en-us/money-diary-nyc"
        );
        assert_eq!(
            story_url("https://www.refinery29.com/", "/x"),
            "https://www.refinery29.com/x"
        );
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = Recommendation::InsufficientText {
            cluster: 2,
            reason: "empty".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "insufficient_text");
        assert_eq!(json["cluster"], 2);
        assert_eq!(outcome.cluster(), 2);
    }
}
