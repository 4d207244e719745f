// src/topics.rs
use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TopicConfig;
use crate::error::{DiaryError, Result};
use crate::nmf::Nmf;
use crate::utils::round_to;
use crate::vectorizer::{CountVectorizer, CountVectorizerBuilder};

/// A document of one topic corpus: its story identifier (the URL suffix)
/// and the text the model is fitted on.
#[derive(Debug, Clone, Copy)]
pub struct TopicDocument<'a> {
    pub story_title: &'a str,
    pub text: &'a str,
}

/// Vectorizer, NMF and document-topic matrix fitted on one corpus.
///
/// Row `i` of `doc_topic` belongs to `story_titles[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    scope: String,
    vectorizer: CountVectorizer,
    nmf: Nmf,
    doc_topic: Array2<f64>,
    story_titles: Vec<String>,
}

impl TopicModel {
    /// Fits a topic model on `documents`. At least `min_docs` documents
    /// are required so the recommender always has enough rows to rank.
    pub fn fit(
        scope: &str,
        documents: &[TopicDocument<'_>],
        params: &TopicConfig,
        min_docs: usize,
    ) -> Result<Self> {
        if documents.len() < min_docs.max(1) {
            return Err(DiaryError::model_fit(
                scope,
                format!(
                    "{} documents, at least {} are needed",
                    documents.len(),
                    min_docs.max(1)
                ),
            ));
        }

        let mut builder = CountVectorizerBuilder::new(params);
        for doc in documents {
            builder.add(doc.text);
        }
        let (vectorizer, counts) = builder.build(scope)?;
        let (nmf, doc_topic) = Nmf::fit_transform(&counts, params, scope)?;

        debug!(
            "Topic model for {} - docs={}, terms={}, topics={}",
            scope,
            documents.len(),
            vectorizer.len(),
            nmf.n_topics()
        );
        Ok(Self {
            scope: scope.to_string(),
            vectorizer,
            nmf,
            doc_topic,
            story_titles: documents.iter().map(|d| d.story_title.to_string()).collect(),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn vectorizer(&self) -> &CountVectorizer {
        &self.vectorizer
    }

    pub fn doc_topic(&self) -> &Array2<f64> {
        &self.doc_topic
    }

    pub fn story_titles(&self) -> &[String] {
        &self.story_titles
    }

    pub fn n_documents(&self) -> usize {
        self.story_titles.len()
    }

    /// Topic weights of `text`. `None` when no vocabulary term occurs in it.
    pub fn project(&self, text: &str) -> Result<Option<Array1<f64>>> {
        let counts = self.vectorizer.transform_one(text);
        if counts.iter().all(|&c| c == 0.0) {
            return Ok(None);
        }
        let weights = self.nmf.transform(&counts.insert_axis(Axis(0)))?;
        Ok(Some(weights.row(0).to_owned()))
    }

    /// The `n` heaviest terms of every topic, heaviest first.
    pub fn top_terms(&self, n: usize) -> Vec<Vec<String>> {
        let names = self.vectorizer.feature_names();
        self.nmf
            .top_term_indices(n)
            .into_iter()
            .map(|topic| topic.into_iter().map(|i| names[i].to_string()).collect())
            .collect()
    }

    /// Writes the document-topic matrix as CSV, one row per story,
    /// weights rounded to 5 decimals.
    pub fn export_doc_topic(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["story_title".to_string()];
        header.extend((0..self.nmf.n_topics()).map(|t| format!("topic_{}", t)));
        writer.write_record(&header)?;

        for (title, row) in self.story_titles.iter().zip(self.doc_topic.rows()) {
            let mut record = vec![title.clone()];
            record.extend(row.iter().map(|&w| round_to(w, 5).to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Fits one topic model per cluster. `labels[i]` is the cluster of
/// `documents[i]`; every cluster in `0..n_clusters` must get a model.
pub fn fit_cluster_models(
    documents: &[TopicDocument<'_>],
    labels: &[usize],
    n_clusters: usize,
    params: &TopicConfig,
    min_docs: usize,
) -> Result<BTreeMap<usize, TopicModel>> {
    if documents.len() != labels.len() {
        return Err(DiaryError::config(format!(
            "{} documents but {} cluster labels",
            documents.len(),
            labels.len()
        )));
    }

    let mut grouped: BTreeMap<usize, Vec<TopicDocument<'_>>> =
        (0..n_clusters).map(|c| (c, Vec::new())).collect();
    for (doc, &label) in documents.iter().zip(labels) {
        grouped
            .get_mut(&label)
            .ok_or_else(|| {
                DiaryError::config(format!(
                    "cluster label {} is outside 0..{}",
                    label, n_clusters
                ))
            })?
            .push(*doc);
    }

    let mut models = BTreeMap::new();
    for (cluster, docs) in grouped {
        let scope = format!("cluster {}", cluster);
        let model = TopicModel::fit(&scope, &docs, params, min_docs)?;
        info!(
            "Fitted topic model for {} - docs={}, terms={}",
            scope,
            model.n_documents(),
            model.vectorizer().len()
        );
        models.insert(cluster, model);
    }
    Ok(models)
}
