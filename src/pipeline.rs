//! Training: from cleaned diarists and raw diaries to a [`ModelBundle`].

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::artifacts::ModelBundle;
use crate::clustering::{feature_matrix, ClusterModel};
use crate::config::PipelineConfig;
use crate::error::{DiaryError, Result};
use crate::nouns::{extract_nouns, PosTagger};
use crate::records::{write_clustered, CorpusDocument, Diarist, RawDiary};
use crate::text::{clean_text, join_paragraphs};
use crate::topics::{fit_cluster_models, TopicDocument, TopicModel};

pub const MODEL_FILE: &str = "model.json";
pub const CLUSTERED_FILE: &str = "clustered_diarists.csv";

pub fn doc_topic_file(cluster: usize) -> String {
    format!("cluster_{}_doc_topic.csv", cluster)
}

/// Joins diaries to their diarists and prepares the text of each one.
///
/// Diaries without a diarist are dropped with a warning. Two diaries for
/// the same story are a data-quality error.
pub fn build_corpus(
    diarists: &[Diarist],
    diaries: &[RawDiary],
    tagger: &dyn PosTagger,
) -> Result<Vec<CorpusDocument>> {
    let by_title: HashMap<&str, usize> = diarists
        .iter()
        .enumerate()
        .map(|(i, d)| (d.story_title.as_str(), i))
        .collect();

    let mut seen = HashSet::new();
    let mut corpus = Vec::new();
    let mut orphans = 0;
    for (record, diary) in diaries.iter().enumerate() {
        let Some(&diarist) = by_title.get(diary.story_title.as_str()) else {
            debug!("No diarist for diary {}", diary.story_title);
            orphans += 1;
            continue;
        };
        if !seen.insert(diary.story_title.as_str()) {
            return Err(DiaryError::data_quality(
                record,
                format!("second diary for story {}", diary.story_title),
            ));
        }

        let cleaned = clean_text(&join_paragraphs(&diary.diary_text));
        let nouns = extract_nouns(tagger, &cleaned)?;
        corpus.push(CorpusDocument {
            story_title: diary.story_title.clone(),
            diarist,
            cleaned,
            nouns,
        });
    }

    if orphans > 0 {
        warn!("Dropped {} diaries with no matching diarist", orphans);
    }
    let missing_text = diarists.len() - corpus.len();
    if missing_text > 0 {
        debug!("{} diarists have no diary text", missing_text);
    }
    info!(
        "Corpus built - documents={}, tagger={}",
        corpus.len(),
        tagger.name()
    );
    Ok(corpus)
}

/// Everything a training run produces.
#[derive(Debug)]
pub struct TrainingOutput {
    pub bundle: ModelBundle,
    pub diarists: Vec<Diarist>,
    /// Cluster of each diarist
    pub labels: Vec<usize>,
}

impl TrainingOutput {
    /// Writes the bundle, the clustered diarist table and the per-cluster
    /// document-topic tables into `dir`. Returns the files written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let model_path = dir.join(MODEL_FILE);
        self.bundle.save(&model_path)?;
        written.push(model_path);

        let clustered_path = dir.join(CLUSTERED_FILE);
        write_clustered(&clustered_path, &self.diarists, &self.labels)?;
        written.push(clustered_path);

        for (cluster, model) in &self.bundle.clusters {
            let path = dir.join(doc_topic_file(*cluster));
            model.export_doc_topic(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Clusters the diarists and fits a topic model per cluster plus one over
/// the whole corpus.
pub fn train(
    config: &PipelineConfig,
    diarists: Vec<Diarist>,
    diaries: &[RawDiary],
    tagger: &dyn PosTagger,
) -> Result<TrainingOutput> {
    config.validate()?;
    info!("Training started - diarists={}, diaries={}", diarists.len(), diaries.len());

    let features = feature_matrix(&diarists);
    let (clustering, labels) = ClusterModel::fit(&features, &config.clustering)?;

    let corpus = build_corpus(&diarists, diaries, tagger)?;
    let documents: Vec<TopicDocument<'_>> = corpus
        .iter()
        .map(|doc| TopicDocument {
            story_title: &doc.story_title,
            text: &doc.nouns,
        })
        .collect();
    let doc_labels: Vec<usize> = corpus.iter().map(|doc| labels[doc.diarist]).collect();

    let min_docs = config.recommend.count;
    let clusters = fit_cluster_models(
        &documents,
        &doc_labels,
        clustering.n_clusters(),
        &config.topics,
        min_docs,
    )?;
    let all = TopicModel::fit("all diarists", &documents, &config.topics, min_docs)?;

    info!("Training complete - clusters={}", clusters.len());
    let bundle = ModelBundle::new(config.clone(), clustering, clusters, all);
    Ok(TrainingOutput {
        bundle,
        diarists,
        labels,
    })
}
