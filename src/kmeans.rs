//! K-Means clustering on top of linfa, plus the elbow and silhouette sweeps

use std::ops::RangeInclusive;

use linfa::prelude::*;
use linfa_clustering::{KMeans, KMeansInit};
use linfa_nn::distance::L2Dist;
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use crate::config::KMeansConfig;
use crate::error::DataError;
use crate::metrics::{self, squared_distance};

/// Fitted K-Means model with its training assignments
#[derive(Debug)]
pub struct ClusterModel {
    model: KMeans<f64, L2Dist>,
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignments for the training data
    pub labels: Array1<usize>,
    /// Cluster centroids in the space the model was fit in
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
}

impl ClusterModel {
    /// Assign a single point to its nearest centroid
    pub fn predict(&self, point: ArrayView1<f64>) -> crate::Result<usize> {
        let row = point.insert_axis(Axis(0)).to_owned();
        Ok(self.predict_batch(&row)?[0])
    }

    /// Assign every row of `features` to a cluster
    pub fn predict_batch(&self, features: &Array2<f64>) -> crate::Result<Array1<usize>> {
        if features.ncols() != self.centroids.ncols() {
            return Err(DataError::DimensionMismatch {
                expected: self.centroids.ncols(),
                actual: features.ncols(),
            }
            .into());
        }
        Ok(self.model.predict(features))
    }

    /// Number of training points per cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Silhouette score of the training assignments
    pub fn silhouette(&self, features: &Array2<f64>) -> crate::Result<f64> {
        metrics::silhouette_score(features, &self.labels)
    }
}

/// Fit K-Means with k-means++ initialization
///
/// # Arguments
/// * `features` - Feature matrix (n_samples, n_features), usually standardized
/// * `config` - Cluster count, iteration limit, tolerance, restarts and seed
///
/// # Returns
/// * Fitted `ClusterModel` with training labels, centroids and inertia
pub fn fit_kmeans(features: &Array2<f64>, config: &KMeansConfig) -> crate::Result<ClusterModel> {
    fit_with_init(features, config, KMeansInit::KMeansPlusPlus, config.n_runs)
}

fn validate(features: &Array2<f64>, n_clusters: usize) -> crate::Result<()> {
    if n_clusters == 0 {
        return Err(
            DataError::InvalidParameter("number of clusters must be at least 1".into()).into(),
        );
    }
    if features.nrows() < n_clusters {
        return Err(DataError::InvalidParameter(format!(
            "number of data points ({}) must be at least equal to number of clusters ({})",
            features.nrows(),
            n_clusters
        ))
        .into());
    }
    Ok(())
}

fn fit_with_init(
    features: &Array2<f64>,
    config: &KMeansConfig,
    init: KMeansInit<f64>,
    n_runs: usize,
) -> crate::Result<ClusterModel> {
    validate(features, config.n_clusters)?;

    let dataset = DatasetBase::from(features.clone());
    let rng = StdRng::seed_from_u64(config.seed);

    let model = KMeans::params_with(config.n_clusters, rng, L2Dist)
        .max_n_iterations(config.max_iters)
        .tolerance(config.tolerance)
        .n_runs(n_runs.max(1))
        .init_method(init)
        .fit(&dataset)?;

    let labels = model.predict(features);
    let centroids = model.centroids().clone();
    let inertia = metrics::wcss(features, &labels, &centroids);

    debug!(k = config.n_clusters, inertia, "k-means fitted");

    Ok(ClusterModel {
        model,
        n_clusters: config.n_clusters,
        labels,
        centroids,
        inertia,
    })
}

/// Previous centroids plus the point farthest from its assigned centroid
fn grow_centroids(features: &Array2<f64>, previous: &ClusterModel) -> crate::Result<Array2<f64>> {
    let (farthest, _) = previous
        .labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            (
                i,
                squared_distance(&features.row(i), &previous.centroids.row(label)),
            )
        })
        .fold((0, f64::NEG_INFINITY), |best, (i, d)| if d > best.1 { (i, d) } else { best });

    let extra = features.row(farthest).insert_axis(Axis(0));
    Ok(concatenate(Axis(0), &[previous.centroids.view(), extra])?)
}

/// WCSS for one K of the elbow sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub wcss: f64,
}

/// Silhouette score for one K of the silhouette sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SilhouettePoint {
    pub k: usize,
    pub score: f64,
}

fn check_range(ks: &RangeInclusive<usize>, floor: usize) -> crate::Result<()> {
    if ks.is_empty() || *ks.start() < floor {
        return Err(DataError::InvalidParameter(format!(
            "invalid K range {}..={} (minimum K is {})",
            ks.start(),
            ks.end(),
            floor
        ))
        .into());
    }
    Ok(())
}

/// Within-cluster sum of squares for each K in the range
///
/// Every K after the first is fit twice: from fresh k-means++ seeds and from
/// the previous K's centroids plus the worst-served point. The warm start
/// cannot end above the previous WCSS, so the sequence never increases.
pub fn elbow_sweep(
    features: &Array2<f64>,
    ks: RangeInclusive<usize>,
    config: &KMeansConfig,
) -> crate::Result<Vec<ElbowPoint>> {
    check_range(&ks, 1)?;
    validate(features, *ks.end())?;

    let mut points = Vec::with_capacity(ks.clone().count());
    let mut previous: Option<ClusterModel> = None;

    for k in ks {
        let k_config = KMeansConfig {
            n_clusters: k,
            ..config.clone()
        };
        let fresh = fit_kmeans(features, &k_config)?;

        let best = match previous.take() {
            Some(prev) => {
                let init = KMeansInit::Precomputed(grow_centroids(features, &prev)?);
                let warm = fit_with_init(features, &k_config, init, 1)?;
                if warm.inertia < fresh.inertia {
                    debug!(k, "warm start beat k-means++");
                    warm
                } else {
                    fresh
                }
            }
            None => fresh,
        };

        points.push(ElbowPoint {
            k,
            wcss: best.inertia,
        });
        previous = Some(best);
    }

    Ok(points)
}

/// Silhouette score for each K in the range (K >= 2)
pub fn silhouette_sweep(
    features: &Array2<f64>,
    ks: RangeInclusive<usize>,
    config: &KMeansConfig,
) -> crate::Result<Vec<SilhouettePoint>> {
    check_range(&ks, 2)?;
    validate(features, *ks.end())?;

    ks.map(|k| -> crate::Result<SilhouettePoint> {
        let k_config = KMeansConfig {
            n_clusters: k,
            ..config.clone()
        };
        let model = fit_kmeans(features, &k_config)?;
        let score = model.silhouette(features)?;
        debug!(k, score, "silhouette");
        Ok(SilhouettePoint { k, score })
    })
    .collect()
}

/// K with the highest silhouette score; ties go to the smaller K
pub fn best_k(points: &[SilhouettePoint]) -> Option<usize> {
    points
        .iter()
        .fold(None::<&SilhouettePoint>, |best, p| match best {
            Some(b) if b.score >= p.score => Some(b),
            _ => Some(p),
        })
        .map(|p| p.k)
}

/// Per-cluster mean of `records` (for example raw, unscaled features)
pub fn cluster_means(
    records: &Array2<f64>,
    labels: &Array1<usize>,
    n_clusters: usize,
) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros((n_clusters, records.ncols()));
    let mut counts = vec![0usize; n_clusters];

    for (row, &label) in records.axis_iter(Axis(0)).zip(labels.iter()) {
        if label < n_clusters {
            let mut sum = sums.row_mut(label);
            sum += &row;
            counts[label] += 1;
        }
    }

    for (mut sum, &count) in sums.axis_iter_mut(Axis(0)).zip(counts.iter()) {
        if count > 0 {
            sum /= count as f64;
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Three tight groups of four points
    fn blobs() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [0.3, 0.2],
            [5.0, 5.0],
            [5.2, 5.1],
            [5.1, 5.3],
            [5.3, 4.9],
            [0.0, 8.0],
            [0.2, 8.1],
            [0.1, 7.8],
            [0.3, 8.2],
        ]
    }

    fn config(k: usize) -> KMeansConfig {
        KMeansConfig {
            n_clusters: k,
            ..KMeansConfig::default()
        }
    }

    #[test]
    fn test_fit_kmeans() {
        let features = blobs();
        let model = fit_kmeans(&features, &config(3)).unwrap();

        assert_eq!(model.n_clusters, 3);
        assert_eq!(model.labels.len(), 12);
        assert_eq!(model.centroids.shape(), &[3, 2]);
        assert!(model.inertia >= 0.0 && model.inertia.is_finite());

        // each blob ends up in its own cluster
        for group in 0..3 {
            let first = model.labels[group * 4];
            assert!((0..4).all(|i| model.labels[group * 4 + i] == first));
        }
        let mut sizes = model.cluster_sizes();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 4, 4]);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let features = blobs();
        let a = fit_kmeans(&features, &config(3)).unwrap();
        let b = fit_kmeans(&features, &config(3)).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
    }

    #[test]
    fn test_predict_matches_training_assignment() {
        let features = blobs();
        let model = fit_kmeans(&features, &config(3)).unwrap();

        let cluster = model.predict(array![5.1, 5.0].view()).unwrap();
        assert_eq!(cluster, model.labels[4]);
        assert!(model.predict(array![1.0].view()).is_err());

        let batch = model.predict_batch(&features).unwrap();
        assert_eq!(batch, model.labels);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let features = blobs();
        assert!(fit_kmeans(&features, &config(0)).is_err());
        assert!(fit_kmeans(&features, &config(13)).is_err());
    }

    #[test]
    fn test_elbow_is_non_increasing() {
        let features = blobs();
        let points = elbow_sweep(&features, 1..=6, &KMeansConfig::default()).unwrap();

        assert_eq!(points.iter().map(|p| p.k).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        for pair in points.windows(2) {
            assert!(pair[1].wcss <= pair[0].wcss + 1e-9, "{:?}", pair);
        }
    }

    #[test]
    fn test_silhouette_sweep_prefers_true_k() {
        let features = blobs();
        let points = silhouette_sweep(&features, 2..=5, &KMeansConfig::default()).unwrap();

        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| (-1.0..=1.0).contains(&p.score)));
        assert_eq!(best_k(&points), Some(3));
    }

    #[test]
    fn test_sweep_ranges_are_checked() {
        let features = blobs();
        assert!(silhouette_sweep(&features, 1..=3, &KMeansConfig::default()).is_err());
        assert!(elbow_sweep(&features, 0..=3, &KMeansConfig::default()).is_err());
        assert!(elbow_sweep(&features, 1..=20, &KMeansConfig::default()).is_err());
    }

    #[test]
    fn test_best_k_ties_go_to_smaller_k() {
        let points = [
            SilhouettePoint { k: 2, score: 0.5 },
            SilhouettePoint { k: 3, score: 0.5 },
            SilhouettePoint { k: 4, score: 0.1 },
        ];
        assert_eq!(best_k(&points), Some(2));
        assert_eq!(best_k(&[]), None);
    }

    #[test]
    fn test_cluster_means() {
        let records = array![[1.0, 10.0], [3.0, 30.0], [100.0, 0.0]];
        let labels = array![1, 1, 0];
        let means = cluster_means(&records, &labels, 3);

        assert_eq!(means.row(0), array![100.0, 0.0]);
        assert_eq!(means.row(1), array![2.0, 20.0]);
        assert_eq!(means.row(2), array![0.0, 0.0]);
    }
}
