//! Pipeline defaults and per-command configuration
//!
//! Column names match the Social Network Ads and Mall Customers datasets.

use serde::Serialize;

/// Feature columns for the SVM walkthrough
pub const SVM_FEATURES: [&str; 2] = ["Age", "EstimatedSalary"];

/// Binary target column for the SVM walkthrough
pub const SVM_TARGET: &str = "Purchased";

/// Feature columns for the basic clustering walkthrough
pub const KMEANS_FEATURES: [&str; 2] = ["Annual Income (k$)", "Spending Score (1-100)"];

/// Feature columns for the advanced (PCA) clustering walkthrough
pub const ADVANCED_FEATURES: [&str; 3] = ["Age", "Annual Income (k$)", "Spending Score (1-100)"];

/// Held-out fraction for the train/test split (75/25)
pub const TEST_FRACTION: f64 = 0.25;

/// Seed shared by the split, K-Means initialization and sweeps
pub const DEFAULT_SEED: u64 = 42;

/// SVM regularization strength
pub const DEFAULT_C: f64 = 1.0;

/// RBF bandwidths inspected by the gamma sweep
pub const DEFAULT_GAMMAS: [f64; 3] = [0.1, 1.0, 10.0];

/// Gamma used for the headline RBF classifier
pub const DEFAULT_RBF_GAMMA: f64 = 1.0;

/// Cells per axis of the decision-boundary grid
pub const DEFAULT_GRID_RESOLUTION: usize = 200;

pub const DEFAULT_CLUSTERS: usize = 5;
pub const DEFAULT_MAX_ITERS: u64 = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_N_RUNS: usize = 10;

/// Elbow sweep range
pub const ELBOW_K_MIN: usize = 1;
pub const ELBOW_K_MAX: usize = 10;

/// Silhouette sweep range (silhouette is undefined for K = 1)
pub const SILHOUETTE_K_MIN: usize = 2;
pub const SILHOUETTE_K_MAX: usize = 10;

pub const DEFAULT_PCA_COMPONENTS: usize = 2;

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// SVM classification pipeline settings
#[derive(Debug, Clone, Serialize)]
pub struct SvmConfig {
    pub features: Vec<String>,
    pub target: String,
    pub test_fraction: f64,
    pub c: f64,
    pub rbf_gamma: f64,
    pub gammas: Vec<f64>,
    pub grid_resolution: usize,
    /// Also fit a polynomial kernel `(<x, y> + 1)^degree` when set
    pub poly_degree: Option<f64>,
    pub seed: u64,
    /// Raw (unscaled) feature values to classify after training
    pub predict: Option<Vec<f64>>,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            features: owned(&SVM_FEATURES),
            target: SVM_TARGET.to_string(),
            test_fraction: TEST_FRACTION,
            c: DEFAULT_C,
            rbf_gamma: DEFAULT_RBF_GAMMA,
            gammas: DEFAULT_GAMMAS.to_vec(),
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            poly_degree: None,
            seed: DEFAULT_SEED,
            predict: None,
        }
    }
}

/// K-Means fitting parameters
#[derive(Debug, Clone, Serialize)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    pub max_iters: u64,
    pub tolerance: f64,
    pub n_runs: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: DEFAULT_CLUSTERS,
            max_iters: DEFAULT_MAX_ITERS,
            tolerance: DEFAULT_TOLERANCE,
            n_runs: DEFAULT_N_RUNS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Fixed-K clustering pipeline settings
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringConfig {
    pub features: Vec<String>,
    pub kmeans: KMeansConfig,
    /// Raw (unscaled) feature values to assign to a cluster
    pub predict: Option<Vec<f64>>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            features: owned(&KMEANS_FEATURES),
            kmeans: KMeansConfig::default(),
            predict: None,
        }
    }
}

/// Elbow or silhouette sweep settings
#[derive(Debug, Clone, Serialize)]
pub struct SweepConfig {
    pub features: Vec<String>,
    pub k_min: usize,
    pub k_max: usize,
    pub kmeans: KMeansConfig,
}

impl SweepConfig {
    pub fn elbow() -> Self {
        Self {
            features: owned(&KMEANS_FEATURES),
            k_min: ELBOW_K_MIN,
            k_max: ELBOW_K_MAX,
            kmeans: KMeansConfig::default(),
        }
    }

    pub fn silhouette() -> Self {
        Self {
            k_min: SILHOUETTE_K_MIN,
            k_max: SILHOUETTE_K_MAX,
            ..Self::elbow()
        }
    }
}

/// PCA + K-Means pipeline settings
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedConfig {
    pub features: Vec<String>,
    pub n_components: usize,
    pub kmeans: KMeansConfig,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            features: owned(&ADVANCED_FEATURES),
            n_components: DEFAULT_PCA_COMPONENTS,
            kmeans: KMeansConfig::default(),
        }
    }
}
