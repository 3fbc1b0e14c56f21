//! The walkthrough pipelines: exploration, SVM classification, and the
//! K-Means variations (fixed K, elbow, silhouette, PCA + K-Means)

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{AdvancedConfig, ClusteringConfig, KMeansConfig, SvmConfig, SweepConfig};
use crate::data::{self, ColumnSummary};
use crate::kmeans::{self, ClusterModel, ElbowPoint, SilhouettePoint};
use crate::preprocess::{self, StandardScaler};
use crate::reduction;
use crate::svm::{ClassifierEvaluation, Kernel, SvmClassifier};
use crate::viz;

/// Where (and whether) plots are written
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory for PNG output; `None` skips plotting
    pub plots_dir: Option<PathBuf>,
}

impl RunOptions {
    pub fn with_plots(dir: impl Into<PathBuf>) -> Self {
        Self {
            plots_dir: Some(dir.into()),
        }
    }

    fn plot_path(&self, file_name: &str) -> crate::Result<Option<PathBuf>> {
        match &self.plots_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                Ok(Some(dir.join(file_name)))
            }
            None => Ok(None),
        }
    }
}

fn record_plot(plots: &mut Vec<PathBuf>, path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(p) = &path {
        plots.push(p.clone());
    }
    path
}

/// Result of the data exploration step
#[derive(Debug, Clone, Serialize)]
pub struct ExplorationReport {
    pub source: PathBuf,
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub total_nulls: usize,
    pub plots: Vec<PathBuf>,
}

/// Load a CSV, summarize every column and draw box plots of the numeric ones
pub fn run_exploration(path: &Path, options: &RunOptions) -> crate::Result<ExplorationReport> {
    info!("Exploring {}", path.display());
    let df = data::load_csv(path)?;
    let columns = data::summarize(&df)?;
    let total_nulls: usize = columns.iter().map(|c| c.nulls).sum();
    if total_nulls > 0 {
        warn!(total_nulls, "dataset contains missing values");
    }

    let mut plots = Vec::new();
    if let Some(out) = record_plot(&mut plots, options.plot_path("box_plots.png")?) {
        let numeric: Vec<(String, Vec<f64>)> = columns
            .iter()
            .filter(|c| c.numeric.is_some())
            .map(|c| -> crate::Result<(String, Vec<f64>)> {
                let values = df
                    .column(&c.name)?
                    .cast(&polars::prelude::DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .flatten()
                    .collect();
                Ok((c.name.clone(), values))
            })
            .collect::<crate::Result<_>>()?;
        viz::box_plots(&numeric, &out)?;
    }

    Ok(ExplorationReport {
        source: path.to_path_buf(),
        rows: df.height(),
        columns,
        total_nulls,
        plots,
    })
}

/// Accuracy of the RBF classifier for one gamma
#[derive(Debug, Clone, Serialize)]
pub struct GammaEvaluation {
    pub gamma: f64,
    pub accuracy: f64,
    pub support_vectors: usize,
}

/// Classification of a single user-supplied observation
#[derive(Debug, Clone, Serialize)]
pub struct SvmPrediction {
    pub input: Vec<f64>,
    pub scaled: Vec<f64>,
    pub linear: bool,
    pub rbf: bool,
}

/// Result of the SVM classification walkthrough
#[derive(Debug, Clone, Serialize)]
pub struct SvmReport {
    pub config: SvmConfig,
    pub total_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Per-feature mean and standard deviation of the training split
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub linear: ClassifierEvaluation,
    pub rbf: ClassifierEvaluation,
    pub polynomial: Option<ClassifierEvaluation>,
    pub gamma_sweep: Vec<GammaEvaluation>,
    pub prediction: Option<SvmPrediction>,
    pub plots: Vec<PathBuf>,
}

fn boundary_plot(
    model: &SvmClassifier,
    records: &Array2<f64>,
    targets: &Array1<bool>,
    feature_names: &[String],
    resolution: usize,
    title: &str,
    out: &Path,
) -> crate::Result<()> {
    let (x_range, y_range) = viz::feature_ranges(records);
    let grid = model.decision_grid(x_range, y_range, resolution)?;
    let x_label = format!("{} (scaled)", feature_names[0]);
    let y_label = format!("{} (scaled)", feature_names[1]);
    viz::decision_boundary(
        &grid,
        records,
        targets,
        (x_label.as_str(), y_label.as_str()),
        title,
        out,
    )
}

/// Split, scale, fit linear and RBF classifiers, evaluate on the held-out
/// split and sweep the RBF bandwidth
///
/// # Arguments
/// * `path` - CSV with the feature columns and a 0/1 target column
/// * `config` - Columns, split fraction, C, gammas and optional point to classify
/// * `options` - Plot output settings
///
/// # Returns
/// * `SvmReport` with per-kernel evaluations, the gamma comparison and plot paths
pub fn run_svm(path: &Path, config: &SvmConfig, options: &RunOptions) -> crate::Result<SvmReport> {
    let start = Instant::now();
    info!("SVM classification on {}", path.display());

    let labeled = data::load_labeled(path, &config.features, &config.target)?;
    let total_rows = labeled.records.nrows();
    info!(rows = total_rows, features = ?labeled.feature_names, "data loaded");

    let split = preprocess::train_test_split(
        &labeled.records,
        &labeled.targets,
        config.test_fraction,
        config.seed,
    )?;

    // scaler statistics come from the training split only
    let scaler = StandardScaler::fit(&split.train_records)?;
    let train_x = scaler.transform(&split.train_records)?;
    let test_x = scaler.transform(&split.test_records)?;
    debug!(train = split.n_train(), test = split.n_test(), "split and scaled");

    let linear_model =
        SvmClassifier::fit(&train_x, &split.train_targets, Kernel::Linear, config.c)?;
    let linear = linear_model.evaluate(&test_x, &split.test_targets)?;
    info!(accuracy = linear.accuracy, "linear kernel evaluated");

    let rbf_kernel = Kernel::Rbf {
        gamma: config.rbf_gamma,
    };
    let rbf_model = SvmClassifier::fit(&train_x, &split.train_targets, rbf_kernel, config.c)?;
    let rbf = rbf_model.evaluate(&test_x, &split.test_targets)?;
    info!(accuracy = rbf.accuracy, "rbf kernel evaluated");

    let polynomial = match config.poly_degree {
        Some(degree) => {
            let kernel = Kernel::Polynomial {
                constant: 1.0,
                degree,
            };
            let model = SvmClassifier::fit(&train_x, &split.train_targets, kernel, config.c)?;
            let eval = model.evaluate(&test_x, &split.test_targets)?;
            info!(accuracy = eval.accuracy, "polynomial kernel evaluated");
            Some(eval)
        }
        None => None,
    };

    let plot_boundaries = train_x.ncols() == 2;
    if !plot_boundaries && options.plots_dir.is_some() {
        warn!("decision boundaries need exactly two features, skipping those plots");
    }

    let mut plots = Vec::new();
    if plot_boundaries {
        for (model, name) in [(&linear_model, "linear"), (&rbf_model, "rbf")] {
            let file = format!("svm_{name}_boundary.png");
            if let Some(out) = record_plot(&mut plots, options.plot_path(&file)?) {
                let title = format!("SVM ({}) - Test set", model.kernel);
                boundary_plot(
                    model,
                    &test_x,
                    &split.test_targets,
                    &config.features,
                    config.grid_resolution,
                    &title,
                    &out,
                )?;
            }
        }
    }

    let mut gamma_sweep = Vec::with_capacity(config.gammas.len());
    for &gamma in &config.gammas {
        let kernel = Kernel::Rbf { gamma };
        let model = SvmClassifier::fit(&train_x, &split.train_targets, kernel, config.c)?;
        let eval = model.evaluate(&test_x, &split.test_targets)?;
        debug!(gamma, accuracy = eval.accuracy, "gamma sweep");

        if plot_boundaries {
            let file = format!("svm_rbf_gamma_{gamma}.png");
            if let Some(out) = record_plot(&mut plots, options.plot_path(&file)?) {
                let title = format!("RBF kernel, gamma = {gamma}");
                boundary_plot(
                    &model,
                    &train_x,
                    &split.train_targets,
                    &config.features,
                    config.grid_resolution,
                    &title,
                    &out,
                )?;
            }
        }

        gamma_sweep.push(GammaEvaluation {
            gamma,
            accuracy: eval.accuracy,
            support_vectors: eval.support_vectors,
        });
    }

    let prediction = match &config.predict {
        Some(input) => {
            let scaled = scaler.transform_point(input)?;
            Some(SvmPrediction {
                input: input.clone(),
                scaled: scaled.to_vec(),
                linear: linear_model.predict_point(&scaled)?,
                rbf: rbf_model.predict_point(&scaled)?,
            })
        }
        None => None,
    };

    debug!("svm pipeline finished in {:.2}s", start.elapsed().as_secs_f64());

    Ok(SvmReport {
        config: config.clone(),
        total_rows,
        train_rows: split.n_train(),
        test_rows: split.n_test(),
        scaler_mean: scaler.mean.to_vec(),
        scaler_scale: scaler.scale.to_vec(),
        linear,
        rbf,
        polynomial,
        gamma_sweep,
        prediction,
        plots,
    })
}

/// One cluster of a fitted model, in original feature units
#[derive(Debug, Clone, Serialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    pub share: f64,
    /// Per-feature mean of the cluster's members
    pub feature_means: Vec<f64>,
}

fn cluster_profiles(raw: &Array2<f64>, model: &ClusterModel) -> Vec<ClusterProfile> {
    let means = kmeans::cluster_means(raw, &model.labels, model.n_clusters);
    let total = model.labels.len().max(1) as f64;

    model
        .cluster_sizes()
        .into_iter()
        .enumerate()
        .map(|(cluster, size)| ClusterProfile {
            cluster,
            size,
            share: size as f64 / total,
            feature_means: means.row(cluster).to_vec(),
        })
        .collect()
}

/// Cluster assignment of a single user-supplied observation
#[derive(Debug, Clone, Serialize)]
pub struct ClusterPrediction {
    pub input: Vec<f64>,
    pub cluster: usize,
}

/// Result of the fixed-K clustering walkthrough
#[derive(Debug, Clone, Serialize)]
pub struct KMeansReport {
    pub feature_names: Vec<String>,
    pub rows: usize,
    pub kmeans: KMeansConfig,
    pub wcss: f64,
    pub silhouette: Option<f64>,
    pub clusters: Vec<ClusterProfile>,
    /// Centroids mapped back to original feature units
    pub centroids: Vec<Vec<f64>>,
    pub prediction: Option<ClusterPrediction>,
    pub plots: Vec<PathBuf>,
}

fn load_scaled(
    path: &Path,
    features: &[String],
) -> crate::Result<(Array2<f64>, StandardScaler, Array2<f64>)> {
    let data = data::load_features(path, features)?;
    info!(rows = data.records.nrows(), features = ?data.feature_names, "data loaded");
    let (scaler, scaled) = preprocess::fit_transform(&data.records)?;
    Ok((data.records, scaler, scaled))
}

fn optional_silhouette(model: &ClusterModel, features: &Array2<f64>) -> Option<f64> {
    match model.silhouette(features) {
        Ok(score) => Some(score),
        Err(err) => {
            warn!("silhouette unavailable: {err}");
            None
        }
    }
}

/// Standardize the selected features and fit K-Means with a fixed K
pub fn run_kmeans(
    path: &Path,
    config: &ClusteringConfig,
    options: &RunOptions,
) -> crate::Result<KMeansReport> {
    info!("K-Means clustering on {}", path.display());
    let (raw, scaler, scaled) = load_scaled(path, &config.features)?;

    let model = kmeans::fit_kmeans(&scaled, &config.kmeans)?;
    info!(k = model.n_clusters, wcss = model.inertia, "model fitted");
    let silhouette = optional_silhouette(&model, &scaled);

    let centroids = scaler
        .inverse_transform(&model.centroids)?
        .outer_iter()
        .map(|row| row.to_vec())
        .collect();

    let prediction = match &config.predict {
        Some(input) => {
            let point = scaler.transform_point(input)?;
            Some(ClusterPrediction {
                input: input.clone(),
                cluster: model.predict(point.view())?,
            })
        }
        None => None,
    };

    let mut plots = Vec::new();
    if scaled.ncols() >= 2 {
        if let Some(out) = record_plot(&mut plots, options.plot_path("kmeans_clusters.png")?) {
            let title = format!("K-Means clusters (K = {})", model.n_clusters);
            viz::cluster_scatter(
                &scaled,
                &model.labels,
                Some(&model.centroids),
                (config.features[0].as_str(), config.features[1].as_str()),
                &title,
                &out,
            )?;
        }
    }
    if let Some(out) = record_plot(&mut plots, options.plot_path("kmeans_sizes.png")?) {
        viz::cluster_size_chart(&model, &out)?;
    }

    Ok(KMeansReport {
        feature_names: config.features.clone(),
        rows: raw.nrows(),
        kmeans: config.kmeans.clone(),
        wcss: model.inertia,
        silhouette,
        clusters: cluster_profiles(&raw, &model),
        centroids,
        prediction,
        plots,
    })
}

/// Result of the elbow sweep
#[derive(Debug, Clone, Serialize)]
pub struct ElbowReport {
    pub feature_names: Vec<String>,
    pub points: Vec<ElbowPoint>,
    pub plots: Vec<PathBuf>,
}

/// WCSS for each K in the configured range
pub fn run_elbow(
    path: &Path,
    config: &SweepConfig,
    options: &RunOptions,
) -> crate::Result<ElbowReport> {
    info!("Elbow sweep K={}..={} on {}", config.k_min, config.k_max, path.display());
    let (_, _, scaled) = load_scaled(path, &config.features)?;

    let points = kmeans::elbow_sweep(&scaled, config.k_min..=config.k_max, &config.kmeans)?;

    let mut plots = Vec::new();
    if let Some(out) = record_plot(&mut plots, options.plot_path("elbow.png")?) {
        viz::elbow_curve(&points, &out)?;
    }

    Ok(ElbowReport {
        feature_names: config.features.clone(),
        points,
        plots,
    })
}

/// Result of the silhouette sweep
#[derive(Debug, Clone, Serialize)]
pub struct SilhouetteReport {
    pub feature_names: Vec<String>,
    pub points: Vec<SilhouettePoint>,
    pub best_k: Option<usize>,
    pub plots: Vec<PathBuf>,
}

/// Silhouette score for each K in the configured range
pub fn run_silhouette(
    path: &Path,
    config: &SweepConfig,
    options: &RunOptions,
) -> crate::Result<SilhouetteReport> {
    info!("Silhouette sweep K={}..={} on {}", config.k_min, config.k_max, path.display());
    let (_, _, scaled) = load_scaled(path, &config.features)?;

    let points = kmeans::silhouette_sweep(&scaled, config.k_min..=config.k_max, &config.kmeans)?;
    let best_k = kmeans::best_k(&points);

    let mut plots = Vec::new();
    if let Some(out) = record_plot(&mut plots, options.plot_path("silhouette.png")?) {
        viz::silhouette_curve(&points, &out)?;
    }

    Ok(SilhouetteReport {
        feature_names: config.features.clone(),
        points,
        best_k,
        plots,
    })
}

/// Result of the PCA + K-Means walkthrough
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedReport {
    pub feature_names: Vec<String>,
    pub rows: usize,
    pub kmeans: KMeansConfig,
    pub explained_variance_ratio: Vec<f64>,
    pub wcss: f64,
    pub silhouette: f64,
    pub clusters: Vec<ClusterProfile>,
    pub labels: Vec<usize>,
    pub plots: Vec<PathBuf>,
}

/// Standardize, project onto principal components and cluster the projection
pub fn run_advanced(
    path: &Path,
    config: &AdvancedConfig,
    options: &RunOptions,
) -> crate::Result<AdvancedReport> {
    info!("PCA + K-Means on {}", path.display());
    let (raw, _, scaled) = load_scaled(path, &config.features)?;

    let pca = reduction::project(&scaled, config.n_components)?;
    info!(
        components = pca.n_components(),
        explained = pca.total_explained(),
        "pca projection"
    );

    let model = kmeans::fit_kmeans(&pca.projected, &config.kmeans)?;
    let silhouette = model.silhouette(&pca.projected)?;
    info!(k = model.n_clusters, silhouette, "model fitted");

    let mut plots = Vec::new();
    if pca.n_components() >= 2 {
        if let Some(out) = record_plot(&mut plots, options.plot_path("pca_clusters.png")?) {
            let title = format!("Clusters on principal components (K = {})", model.n_clusters);
            viz::cluster_scatter(
                &pca.projected,
                &model.labels,
                Some(&model.centroids),
                ("PC1", "PC2"),
                &title,
                &out,
            )?;
        }
    }
    if raw.ncols() >= 3 {
        if let Some(out) = record_plot(&mut plots, options.plot_path("clusters_3d.png")?) {
            let title = format!(
                "{} / {} / {}",
                config.features[0], config.features[1], config.features[2]
            );
            viz::cluster_scatter_3d(&raw, &model.labels, &title, &out)?;
        }
    }

    Ok(AdvancedReport {
        feature_names: config.features.clone(),
        rows: raw.nrows(),
        kmeans: config.kmeans.clone(),
        explained_variance_ratio: pca.explained_variance_ratio.clone(),
        wcss: model.inertia,
        silhouette,
        clusters: cluster_profiles(&raw, &model),
        labels: model.labels.to_vec(),
        plots,
    })
}
