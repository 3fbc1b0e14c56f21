//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::{self, AdvancedConfig, ClusteringConfig, KMeansConfig, SvmConfig, SweepConfig};
use crate::pipeline::RunOptions;

/// SVM classification and K-Means clustering walkthroughs on CSV data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory for the generated PNG plots
    #[arg(short, long, global = true, default_value = "plots")]
    pub output_dir: PathBuf,

    /// Skip plot generation
    #[arg(long, global = true)]
    pub no_plots: bool,

    /// Print the report as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Random seed for the split, K-Means initialization and sweeps
    #[arg(long, global = true, default_value_t = config::DEFAULT_SEED)]
    pub seed: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Null counts, column statistics and box plots
    Explore(ExploreArgs),
    /// Linear and RBF SVM classification with a 75/25 split
    Svm(SvmArgs),
    /// K-Means with a fixed number of clusters
    Kmeans(KMeansArgs),
    /// WCSS for a range of K (elbow method)
    Elbow(SweepArgs),
    /// Silhouette score for a range of K
    Silhouette(SweepArgs),
    /// Standardize, reduce with PCA, then cluster
    Advanced(AdvancedArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ExploreArgs {
    /// Path to the input CSV file
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct SvmArgs {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "Social_Network_Ads.csv")]
    pub input: PathBuf,

    /// Feature columns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Binary (0/1) target column
    #[arg(long, default_value = config::SVM_TARGET)]
    pub target: String,

    /// Held-out fraction of rows
    #[arg(long, default_value_t = config::TEST_FRACTION)]
    pub test_size: f64,

    /// Regularization strength
    #[arg(long, default_value_t = config::DEFAULT_C)]
    pub c: f64,

    /// Gamma of the headline RBF classifier
    #[arg(long, default_value_t = config::DEFAULT_RBF_GAMMA)]
    pub gamma: f64,

    /// RBF gammas to compare, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = config::DEFAULT_GAMMAS.to_vec())]
    pub gammas: Vec<f64>,

    /// Cells per axis of the decision-boundary plots
    #[arg(long, default_value_t = config::DEFAULT_GRID_RESOLUTION)]
    pub grid_resolution: usize,

    /// Also evaluate a polynomial kernel of this degree
    #[arg(long)]
    pub degree: Option<f64>,

    /// Classify one observation given in raw units, e.g. "30,87000"
    #[arg(short, long)]
    pub predict: Option<String>,
}

/// K-Means fitting flags shared by the clustering commands
#[derive(ClapArgs, Debug)]
pub struct KMeansFlags {
    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value_t = config::DEFAULT_MAX_ITERS)]
    pub max_iters: u64,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value_t = config::DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Number of k-means++ restarts; the lowest-WCSS run is kept
    #[arg(long, default_value_t = config::DEFAULT_N_RUNS)]
    pub n_runs: usize,
}

impl KMeansFlags {
    fn to_config(&self, n_clusters: usize, seed: u64) -> KMeansConfig {
        KMeansConfig {
            n_clusters,
            max_iters: self.max_iters,
            tolerance: self.tolerance,
            n_runs: self.n_runs,
            seed,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct KMeansArgs {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "Mall_Customers.csv")]
    pub input: PathBuf,

    /// Feature columns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Number of clusters for K-Means
    #[arg(short = 'k', long, default_value_t = config::DEFAULT_CLUSTERS)]
    pub clusters: usize,

    #[command(flatten)]
    pub kmeans: KMeansFlags,

    /// Assign one observation given in raw units, e.g. "60,50"
    #[arg(short, long)]
    pub predict: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct SweepArgs {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "Mall_Customers.csv")]
    pub input: PathBuf,

    /// Feature columns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Smallest K (defaults to 1 for elbow, 2 for silhouette)
    #[arg(long)]
    pub k_min: Option<usize>,

    /// Largest K
    #[arg(long)]
    pub k_max: Option<usize>,

    #[command(flatten)]
    pub kmeans: KMeansFlags,
}

#[derive(ClapArgs, Debug)]
pub struct AdvancedArgs {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "Mall_Customers.csv")]
    pub input: PathBuf,

    /// Feature columns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Number of clusters for K-Means
    #[arg(short = 'k', long, default_value_t = config::DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Number of principal components to keep
    #[arg(long, default_value_t = config::DEFAULT_PCA_COMPONENTS)]
    pub components: usize,

    #[command(flatten)]
    pub kmeans: KMeansFlags,
}

fn features_or(features: &[String], defaults: Vec<String>) -> Vec<String> {
    if features.is_empty() {
        defaults
    } else {
        features.iter().map(|f| f.trim().to_string()).collect()
    }
}

/// Parse comma-separated feature values, e.g. "30,87000"
pub fn parse_values(input: &str, expected: usize) -> crate::Result<Vec<f64>> {
    let parts: Vec<&str> = input.split(',').collect();
    if parts.len() != expected {
        anyhow::bail!(
            "Predict values must have {} comma-separated numbers, got '{}'",
            expected,
            input
        );
    }

    parts
        .iter()
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("Invalid value: {}", p))
        })
        .collect()
}

fn parse_prediction(
    predict: &Option<String>,
    features: &[String],
) -> crate::Result<Option<Vec<f64>>> {
    predict
        .as_deref()
        .map(|s| parse_values(s, features.len()))
        .transpose()
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        if self.no_plots {
            RunOptions::default()
        } else {
            RunOptions::with_plots(&self.output_dir)
        }
    }
}

impl SvmArgs {
    pub fn to_config(&self, seed: u64) -> crate::Result<SvmConfig> {
        let defaults = SvmConfig::default();
        let features = features_or(&self.features, defaults.features);
        let predict = parse_prediction(&self.predict, &features)?;

        Ok(SvmConfig {
            features,
            target: self.target.clone(),
            test_fraction: self.test_size,
            c: self.c,
            rbf_gamma: self.gamma,
            gammas: self.gammas.clone(),
            grid_resolution: self.grid_resolution,
            poly_degree: self.degree,
            seed,
            predict,
        })
    }
}

impl KMeansArgs {
    pub fn to_config(&self, seed: u64) -> crate::Result<ClusteringConfig> {
        let features = features_or(&self.features, ClusteringConfig::default().features);
        let predict = parse_prediction(&self.predict, &features)?;

        Ok(ClusteringConfig {
            features,
            kmeans: self.kmeans.to_config(self.clusters, seed),
            predict,
        })
    }
}

impl SweepArgs {
    /// Fill unset bounds from `defaults` (elbow or silhouette)
    pub fn to_config(&self, defaults: SweepConfig, seed: u64) -> SweepConfig {
        SweepConfig {
            features: features_or(&self.features, defaults.features),
            k_min: self.k_min.unwrap_or(defaults.k_min),
            k_max: self.k_max.unwrap_or(defaults.k_max),
            kmeans: self.kmeans.to_config(defaults.kmeans.n_clusters, seed),
        }
    }
}

impl AdvancedArgs {
    pub fn to_config(&self, seed: u64) -> AdvancedConfig {
        AdvancedConfig {
            features: features_or(&self.features, AdvancedConfig::default().features),
            n_components: self.components,
            kmeans: self.kmeans.to_config(self.clusters, seed),
        }
    }
}
