//! The trained model bundle.
//!
//! Training produces one [`ModelBundle`] that is written to disk as JSON
//! and loaded, unchanged, by every recommendation request.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clustering::ClusterModel;
use crate::config::PipelineConfig;
use crate::error::{DiaryError, Result};
use crate::topics::TopicModel;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    /// Config the bundle was trained with
    pub config: PipelineConfig,
    pub clustering: ClusterModel,
    /// Topic model per cluster id
    pub clusters: BTreeMap<usize, TopicModel>,
    /// Topic model over every diary, for inspection
    pub corpus: TopicModel,
}

impl ModelBundle {
    pub fn new(
        config: PipelineConfig,
        clustering: ClusterModel,
        clusters: BTreeMap<usize, TopicModel>,
        corpus: TopicModel,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            config,
            clustering,
            clusters,
            corpus,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!("Saved model bundle to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let bundle: ModelBundle = serde_json::from_reader(reader)?;
        if bundle.format_version != FORMAT_VERSION {
            return Err(DiaryError::artifact(format!(
                "{} has format version {}, expected {}",
                path.display(),
                bundle.format_version,
                FORMAT_VERSION
            )));
        }
        bundle.config.validate()?;
        bundle.check_clusters()?;
        info!(
            "Loaded model bundle from {} (trained {})",
            path.display(),
            bundle.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        Ok(bundle)
    }

    /// Every centroid needs a topic model.
    fn check_clusters(&self) -> Result<()> {
        for cluster in 0..self.clustering.n_clusters() {
            self.cluster(cluster)?;
        }
        Ok(())
    }

    pub fn cluster(&self, id: usize) -> Result<&TopicModel> {
        self.clusters
            .get(&id)
            .ok_or_else(|| DiaryError::artifact(format!("no topic model for cluster {}", id)))
    }
}
