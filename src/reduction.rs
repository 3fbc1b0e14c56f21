//! Principal component projection on top of linfa-reduction

use linfa::prelude::*;
use linfa_reduction::Pca;
use ndarray::{Array2, Axis};
use tracing::debug;

use crate::error::DataError;

/// Features projected onto their leading principal components
#[derive(Debug, Clone)]
pub struct PcaProjection {
    /// Projected data (n_rows, n_components)
    pub projected: Array2<f64>,
    /// Share of the input's total variance captured by each component
    pub explained_variance_ratio: Vec<f64>,
}

impl PcaProjection {
    pub fn n_components(&self) -> usize {
        self.projected.ncols()
    }

    pub fn total_explained(&self) -> f64 {
        self.explained_variance_ratio.iter().sum()
    }
}

fn column_variances(records: &Array2<f64>) -> Vec<f64> {
    records.var_axis(Axis(0), 1.0).to_vec()
}

/// Fit PCA and project `features` onto their leading principal components
///
/// # Arguments
/// * `features` - Standardized feature matrix (n_rows, n_features)
/// * `n_components` - Number of components to keep, at most `n_features`
///
/// # Returns
/// * `PcaProjection` with components ordered by decreasing explained variance
pub fn project(features: &Array2<f64>, n_components: usize) -> crate::Result<PcaProjection> {
    let max_components = features.ncols().min(features.nrows());
    if n_components == 0 || n_components > max_components {
        return Err(DataError::InvalidParameter(format!(
            "number of components must be in 1..={}, got {}",
            max_components, n_components
        ))
        .into());
    }
    if features.nrows() < 2 {
        return Err(DataError::Empty.into());
    }

    // linfa's truncated solver does not always return the leading subspace,
    // so every component is fitted and the highest-variance ones are kept
    let dataset = DatasetBase::from(features.clone());
    let pca = Pca::params(max_components).fit(&dataset)?;
    let full: Array2<f64> = pca.predict(features);

    let variances = column_variances(&full);
    let mut order: Vec<usize> = (0..variances.len()).collect();
    order.sort_by(|&a, &b| variances[b].total_cmp(&variances[a]));
    order.truncate(n_components);
    let projected = full.select(Axis(1), &order);

    let total_variance: f64 = column_variances(features).iter().sum();
    let explained_variance_ratio = order
        .iter()
        .map(|&i| if total_variance > 0.0 { variances[i] / total_variance } else { 0.0 })
        .collect::<Vec<_>>();

    debug!(?explained_variance_ratio, "pca fitted");

    Ok(PcaProjection {
        projected,
        explained_variance_ratio,
    })
}
