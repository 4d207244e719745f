//! Non-negative matrix factorization, `X ≈ W H`, fitted with
//! multiplicative updates on the Frobenius loss.

use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TopicConfig;
use crate::error::{DiaryError, Result};

const EPSILON: f64 = f64::EPSILON;
/// Convergence is checked every this many iterations
const CHECK_EVERY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nmf {
    /// Topic-term matrix `H`, one row per topic
    components: Array2<f64>,
    max_iterations: usize,
    tolerance: f64,
    n_iter: usize,
    reconstruction_err: f64,
}

fn frobenius(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let diff = x - &w.dot(h);
    diff.mapv(|v| v * v).sum().sqrt()
}

fn update_w(x: &Array2<f64>, w: &mut Array2<f64>, h: &Array2<f64>) {
    let numerator = x.dot(&h.t());
    let denominator = w.dot(&h.dot(&h.t()));
    ndarray::Zip::from(w)
        .and(&numerator)
        .and(&denominator)
        .for_each(|w, &n, &d| *w *= n / d.max(EPSILON));
}

fn update_h(x: &Array2<f64>, w: &Array2<f64>, h: &mut Array2<f64>) {
    let numerator = w.t().dot(x);
    let denominator = w.t().dot(w).dot(&*h);
    ndarray::Zip::from(h)
        .and(&numerator)
        .and(&denominator)
        .for_each(|h, &n, &d| *h *= n / d.max(EPSILON));
}

/// Runs multiplicative updates until the relative drop in error between
/// checks falls under `tolerance`. Returns the iteration count.
fn solve(
    x: &Array2<f64>,
    w: &mut Array2<f64>,
    h: &mut Array2<f64>,
    update_components: bool,
    max_iterations: usize,
    tolerance: f64,
) -> usize {
    let error_at_init = frobenius(x, w, h);
    let mut previous_error = error_at_init;
    let mut n_iter = 0;

    for iteration in 1..=max_iterations {
        n_iter = iteration;
        update_w(x, w, h);
        if update_components {
            update_h(x, w, h);
        }

        if tolerance > 0.0 && iteration % CHECK_EVERY == 0 {
            let error = frobenius(x, w, h);
            if error_at_init == 0.0 || (previous_error - error) / error_at_init < tolerance {
                break;
            }
            previous_error = error;
        }
    }
    n_iter
}

impl Nmf {
    /// Factorizes the document-term matrix `x`; returns the model and the
    /// document-topic matrix `W`.
    pub fn fit_transform(x: &Array2<f64>, params: &TopicConfig, scope: &str) -> Result<(Self, Array2<f64>)> {
        let (n_samples, n_features) = x.dim();
        let k = params.n_topics;
        if k == 0 {
            return Err(DiaryError::model_fit(scope, "number of topics must be positive"));
        }
        if n_samples == 0 || n_features == 0 {
            return Err(DiaryError::model_fit(scope, "cannot factorize an empty matrix"));
        }
        if x.iter().any(|&v| v < 0.0 || !v.is_finite()) {
            return Err(DiaryError::model_fit(scope, "matrix has negative or non-finite entries"));
        }

        let mean = x.mean().unwrap_or(0.0);
        let avg = (mean / k as f64).sqrt();
        let mut rng = Xoshiro256Plus::seed_from_u64(params.seed);
        let mut draw = |rows: usize, cols: usize| {
            Array2::from_shape_simple_fn((rows, cols), || {
                let z: f64 = StandardNormal.sample(&mut rng);
                avg * z.abs()
            })
        };
        let mut h = draw(k, n_features);
        let mut w = draw(n_samples, k);

        let n_iter = solve(x, &mut w, &mut h, true, params.max_iterations, params.tolerance);
        let reconstruction_err = frobenius(x, &w, &h);
        debug!(
            "NMF for {} - shape=({}, {}), topics={}, iterations={}, error={:.4}",
            scope, n_samples, n_features, k, n_iter, reconstruction_err
        );
        if n_iter == params.max_iterations && params.tolerance > 0.0 {
            debug!("NMF for {} stopped at the iteration limit", scope);
        }

        let model = Self {
            components: h,
            max_iterations: params.max_iterations,
            tolerance: params.tolerance,
            n_iter,
            reconstruction_err,
        };
        Ok((model, w))
    }

    /// Projects rows of `x` onto the fitted topics, keeping `H` fixed.
    /// An all-zero row projects to all-zero weights.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(DiaryError::artifact(format!(
                "topic model expects {} terms, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        let k = self.n_topics();
        let mean = x.mean().unwrap_or(0.0);
        let avg = (mean / k as f64).sqrt();
        let mut w = Array2::from_elem((x.nrows(), k), avg);
        solve(x, &mut w, &mut self.components.clone(), false, self.max_iterations, self.tolerance);
        Ok(w)
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn n_topics(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.components.ncols()
    }

    pub fn reconstruction_err(&self) -> f64 {
        self.reconstruction_err
    }

    /// Column indices of the `n` heaviest terms of every topic, heaviest
    /// first.
    pub fn top_term_indices(&self, n: usize) -> Vec<Vec<usize>> {
        self.components
            .axis_iter(Axis(0))
            .map(|topic| {
                let mut idx: Vec<usize> = (0..topic.len()).collect();
                idx.sort_by(|&a, &b| topic[b].total_cmp(&topic[a]));
                idx.truncate(n);
                idx
            })
            .collect()
    }
}
