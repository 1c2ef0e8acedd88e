// src/algorithms/kmeans.rs

use crate::core::{MiningError, Points, Result};
use crate::utils::{format_point, round_to};
use ndarray::{Array1, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Configuration for the K-Means engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub max_iters: usize,
    /// Stop once the total centroid movement is at most this much.
    pub tolerance: f64,
    /// Seed for choosing the initial centroids.
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        KMeansConfig {
            max_iters: 100,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Outcome of one clustering run.
#[derive(Debug, Clone, Serialize)]
pub struct KMeansResult {
    /// One row per cluster, rounded to two decimals.
    pub centroids: Points,
    /// `labels[i]` is the cluster of point `i`.
    pub labels: Vec<usize>,
    /// Point indices per cluster, ascending.
    pub clusters: Vec<Vec<usize>>,
    pub iterations: usize,
    pub converged: bool,
    /// The clustered points, kept for reporting.
    pub points: Points,
}

impl KMeansResult {
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    /// Indices of clusters that ended with no points.
    pub fn empty_clusters(&self) -> Vec<usize> {
        self.clusters
            .iter()
            .enumerate()
            .filter(|(_, members)| members.is_empty())
            .map(|(c, _)| c)
            .collect()
    }
}

impl fmt::Display for KMeansResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (c, members) in self.clusters.iter().enumerate() {
            if c > 0 {
                writeln!(f)?;
            }
            writeln!(
                f,
                "Cluster {} - Centroid: {}",
                c + 1,
                format_point(self.centroids.row(c).iter())
            )?;
            for &idx in members {
                writeln!(f, "  Point: {}", format_point(self.points.row(idx).iter()))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: Option<KMeansConfig>) -> Self {
        KMeans {
            config: config.unwrap_or_default(),
        }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    pub fn run(&self, data: &Points, k: usize) -> Result<KMeansResult> {
        let n_points = data.nrows();

        if k == 0 || k > n_points {
            return Err(MiningError::invalid_parameter(format!(
                "k must be in [1, {}], got {}",
                n_points, k
            )));
        }
        if data.ncols() == 0 {
            return Err(MiningError::invalid_dataset(
                "points must have at least one coordinate",
            ));
        }
        if self.config.max_iters == 0 {
            return Err(MiningError::invalid_parameter(
                "max_iters must be at least 1",
            ));
        }
        if !self.config.tolerance.is_finite() || self.config.tolerance < 0.0 {
            return Err(MiningError::invalid_parameter(format!(
                "tolerance must be a finite non-negative number, got {}",
                self.config.tolerance
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let initial = index::sample(&mut rng, n_points, k).into_vec();
        debug!(?initial, "initial centroids chosen");
        let mut centroids = data.select(Axis(0), &initial);

        let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); k];
        let mut iterations = 0;
        let mut converged = false;
        let mut stale: BTreeSet<usize> = BTreeSet::new();

        for _ in 0..self.config.max_iters {
            iterations += 1;
            clusters = vec![Vec::new(); k];
            for (idx, point) in data.outer_iter().enumerate() {
                clusters[nearest_centroid(point, &centroids)].push(idx);
            }

            let previous = centroids.clone();
            for (c, members) in clusters.iter().enumerate() {
                if members.is_empty() {
                    debug!(cluster = c, iteration = iterations, "empty cluster keeps its centroid");
                    stale.insert(c);
                    continue;
                }
                if let Some(mean) = data.select(Axis(0), members).mean_axis(Axis(0)) {
                    centroids.row_mut(c).assign(&mean);
                }
            }

            let shift = (&centroids - &previous).mapv(|d| d * d).sum().sqrt();
            debug!(iteration = iterations, shift, "centroids updated");
            if shift <= self.config.tolerance {
                converged = true;
                break;
            }
        }

        if !stale.is_empty() {
            warn!(clusters = ?stale, "some clusters were empty and kept their centroids");
        }
        if !converged {
            warn!(
                max_iters = self.config.max_iters,
                "k-means stopped before converging"
            );
        }

        let mut labels = vec![0; n_points];
        for (c, members) in clusters.iter().enumerate() {
            for &idx in members {
                labels[idx] = c;
            }
        }

        info!(k, n_points, iterations, converged, "k-means finished");

        Ok(KMeansResult {
            centroids: centroids.mapv(|v| round_to(v, 2)),
            labels,
            clusters,
            iterations,
            converged,
            points: data.to_owned(),
        })
    }
}

/// Index of the closest centroid; the lowest index wins a tie.
fn nearest_centroid(point: ArrayView1<f64>, centroids: &Points) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.outer_iter().enumerate() {
        let dist = euclidean(point, centroid);
        if dist < best_dist {
            best = c;
            best_dist = dist;
        }
    }
    best
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let diff: Array1<f64> = &a - &b;
    diff.dot(&diff).sqrt()
}
