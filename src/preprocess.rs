//! Feature standardization and train/test splitting

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::DataError;

/// Per-column standardization: `(x - mean) / std`
///
/// The standard deviation is the population one (ddof = 0). Columns with
/// zero variance keep a scale of 1.0 so they map to 0 instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and standard deviations
    pub fn fit(records: &Array2<f64>) -> crate::Result<Self> {
        let mean = records.mean_axis(Axis(0)).ok_or(DataError::Empty)?;
        let scale = records
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn check_width(&self, width: usize) -> crate::Result<()> {
        if width != self.n_features() {
            return Err(DataError::DimensionMismatch {
                expected: self.n_features(),
                actual: width,
            }
            .into());
        }
        Ok(())
    }

    /// Standardize a matrix with the fitted statistics
    pub fn transform(&self, records: &Array2<f64>) -> crate::Result<Array2<f64>> {
        self.check_width(records.ncols())?;
        Ok((records - &self.mean) / &self.scale)
    }

    /// Standardize a single observation
    pub fn transform_point(&self, point: &[f64]) -> crate::Result<Array1<f64>> {
        self.check_width(point.len())?;
        let point = ArrayView1::from(point);
        Ok((&point - &self.mean) / &self.scale)
    }

    /// Map standardized values back to original units
    pub fn inverse_transform(&self, records: &Array2<f64>) -> crate::Result<Array2<f64>> {
        self.check_width(records.ncols())?;
        Ok(records * &self.scale + &self.mean)
    }
}

/// Fit a scaler and return it together with the standardized matrix
pub fn fit_transform(records: &Array2<f64>) -> crate::Result<(StandardScaler, Array2<f64>)> {
    let scaler = StandardScaler::fit(records)?;
    let scaled = scaler.transform(records)?;
    Ok((scaler, scaled))
}

/// Shuffled train/test partition of records and targets
#[derive(Debug, Clone)]
pub struct TrainTestSplit<T> {
    pub train_records: Array2<f64>,
    pub train_targets: Array1<T>,
    pub test_records: Array2<f64>,
    pub test_targets: Array1<T>,
}

impl<T> TrainTestSplit<T> {
    pub fn n_train(&self) -> usize {
        self.train_records.nrows()
    }

    pub fn n_test(&self) -> usize {
        self.test_records.nrows()
    }
}

/// Shuffle rows with a seeded RNG and hold out `ceil(n * test_fraction)` of them
pub fn train_test_split<T: Clone>(
    records: &Array2<f64>,
    targets: &Array1<T>,
    test_fraction: f64,
    seed: u64,
) -> crate::Result<TrainTestSplit<T>> {
    let n = records.nrows();
    if targets.len() != n {
        return Err(DataError::DimensionMismatch {
            expected: n,
            actual: targets.len(),
        }
        .into());
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidParameter(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        ))
        .into());
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DataError::InvalidParameter(format!(
            "cannot split {n} rows with test fraction {test_fraction}"
        ))
        .into());
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(TrainTestSplit {
        train_records: records.select(Axis(0), train_idx),
        train_targets: targets.select(Axis(0), train_idx),
        test_records: records.select(Axis(0), test_idx),
        test_targets: targets.select(Axis(0), test_idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_records() -> Array2<f64> {
        array![
            [19.0, 19000.0],
            [35.0, 20000.0],
            [26.0, 43000.0],
            [27.0, 57000.0],
            [19.0, 76000.0],
            [27.0, 58000.0],
            [27.0, 84000.0],
            [32.0, 150000.0],
        ]
    }

    #[test]
    fn test_scaled_columns_have_zero_mean_unit_variance() {
        let (_, scaled) = fit_transform(&sample_records()).unwrap();

        for column in scaled.columns() {
            let mean = column.mean().unwrap();
            let var = column.mapv(|v| (v - mean).powi(2)).mean().unwrap();
            assert!(mean.abs() < 1e-10, "mean {mean}");
            assert!((var - 1.0).abs() < 1e-10, "variance {var}");
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let records = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let (scaler, scaled) = fit_transform(&records).unwrap();

        assert_eq!(scaler.scale[1], 1.0);
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_inverse_transform_restores_units() {
        let records = sample_records();
        let (scaler, scaled) = fit_transform(&records).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (a, b) in restored.iter().zip(records.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_transform_point_checks_width() {
        let scaler = StandardScaler::fit(&sample_records()).unwrap();
        assert!(scaler.transform_point(&[30.0]).is_err());

        let scaled = scaler.transform_point(&[30.0, 87000.0]).unwrap();
        assert_eq!(scaled.len(), 2);
    }

    #[test]
    fn test_fit_rejects_empty() {
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(StandardScaler::fit(&empty).is_err());
    }

    #[test]
    fn test_split_sizes() {
        let records = Array2::from_shape_fn((400, 2), |(i, j)| (i * 2 + j) as f64);
        let targets = Array1::from_shape_fn(400, |i| i % 3 == 0);

        let split = train_test_split(&records, &targets, 0.25, 0).unwrap();
        assert_eq!(split.n_train(), 300);
        assert_eq!(split.n_test(), 100);
        assert_eq!(split.train_targets.len(), 300);
        assert_eq!(split.test_targets.len(), 100);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let records = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let targets = Array1::from_shape_fn(10, |i| i);

        let split = train_test_split(&records, &targets, 0.25, 7).unwrap();
        assert_eq!(split.n_test(), 3);
        assert_eq!(split.n_train() + split.n_test(), 10);

        // every row lands in exactly one partition
        let mut seen: Vec<usize> = split
            .train_targets
            .iter()
            .chain(split.test_targets.iter())
            .copied()
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        let records = Array2::from_shape_fn((50, 1), |(i, _)| i as f64);
        let targets = Array1::from_shape_fn(50, |i| i);

        let a = train_test_split(&records, &targets, 0.25, 42).unwrap();
        let b = train_test_split(&records, &targets, 0.25, 42).unwrap();
        assert_eq!(a.test_targets, b.test_targets);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let records = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
        let targets = Array1::from_shape_fn(10, |i| i);

        assert!(train_test_split(&records, &targets, 0.0, 0).is_err());
        assert!(train_test_split(&records, &targets, 1.0, 0).is_err());
        let short_targets = targets.slice(ndarray::s![..5]).to_owned();
        assert!(train_test_split(&records, &short_targets, 0.25, 0).is_err());
    }
}
