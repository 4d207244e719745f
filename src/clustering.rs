//! Demographic clustering of diarists.
//!
//! Age and salary are standardized with a [`StandardScaler`] and partitioned
//! with seeded k-means. Only the scaler and the centroids are kept: every
//! point, whether a training diarist or a new query, gets the label of its
//! nearest centroid, so there is no way for a query to be unassignable.

use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{array, Array2, ArrayView1, Axis};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ClusteringConfig;
use crate::error::{DiaryError, Result};
use crate::records::Diarist;
use crate::scaler::StandardScaler;

pub const FEATURES: [&str; 2] = ["age", "salary"];

/// One row per diarist: (age, salary).
pub fn feature_matrix(diarists: &[Diarist]) -> Array2<f64> {
    let mut data = Array2::zeros((diarists.len(), FEATURES.len()));
    for (i, d) in diarists.iter().enumerate() {
        data[[i, 0]] = d.age as f64;
        data[[i, 1]] = d.salary;
    }
    data
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    scaler: StandardScaler,
    /// One row per cluster, in scaled feature space
    centroids: Array2<f64>,
}

impl ClusterModel {
    /// Fits the scaler and k-means on `features`; returns the model and the
    /// label of every row.
    pub fn fit(features: &Array2<f64>, params: &ClusteringConfig) -> Result<(Self, Vec<usize>)> {
        let n_records = features.nrows();
        if n_records < params.n_clusters {
            return Err(DiaryError::model_fit(
                "clustering",
                format!(
                    "{} records cannot form {} clusters",
                    n_records, params.n_clusters
                ),
            ));
        }

        let scaler = StandardScaler::fit(features)?;
        let scaled = scaler.transform(features)?;
        debug!(
            "Clustering started - records={}, clusters={}, seed={}",
            n_records, params.n_clusters, params.seed
        );

        let dataset = DatasetBase::from(scaled.clone());
        let rng = Xoshiro256Plus::seed_from_u64(params.seed);
        let kmeans = KMeans::params_with_rng(params.n_clusters, rng)
            .max_n_iterations(params.max_iterations)
            .tolerance(params.tolerance)
            .n_runs(params.n_runs)
            .fit(&dataset)
            .map_err(|e| DiaryError::model_fit("clustering", format!("k-means fit failed: {}", e)))?;

        let model = Self {
            scaler,
            centroids: kmeans.centroids().to_owned(),
        };
        let labels: Vec<usize> = scaled
            .axis_iter(Axis(0))
            .map(|row| model.nearest_centroid(row))
            .collect();

        let mut sizes = vec![0usize; model.n_clusters()];
        for &label in &labels {
            sizes[label] += 1;
        }
        info!("Clustering complete - sizes={:?}", sizes);
        Ok((model, labels))
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Label of the closest centroid to an already-scaled point. Ties go
    /// to the lower label.
    pub fn nearest_centroid(&self, point: ArrayView1<f64>) -> usize {
        let mut best = (0, f64::INFINITY);
        for (label, centroid) in self.centroids.axis_iter(Axis(0)).enumerate() {
            let dist: f64 = centroid
                .iter()
                .zip(point.iter())
                .map(|(c, p)| (c - p).powi(2))
                .sum();
            if dist < best.1 {
                best = (label, dist);
            }
        }
        best.0
    }

    /// Scales `(age, salary)` with the training scaler and predicts its
    /// cluster.
    pub fn predict(&self, age: f64, salary: f64) -> Result<usize> {
        let scaled = self.scaler.transform_row(array![age, salary].view())?;
        Ok(self.nearest_centroid(scaled.view()))
    }
}
