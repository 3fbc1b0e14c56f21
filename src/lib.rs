//! mlforge: SVM classification and K-Means clustering walkthroughs on tabular data
//!
//! The library loads CSV datasets with polars, standardizes features, trains
//! linear and RBF support vector classifiers, and clusters customers with
//! K-Means (fixed K, elbow and silhouette sweeps, and PCA + K-Means).

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod kmeans;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod reduction;
pub mod report;
pub mod svm;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use error::DataError;
pub use kmeans::{fit_kmeans, ClusterModel};
pub use pipeline::{
    run_advanced, run_elbow, run_exploration, run_kmeans, run_silhouette, run_svm, RunOptions,
};
pub use preprocess::{train_test_split, StandardScaler};
pub use svm::{Kernel, SvmClassifier};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
