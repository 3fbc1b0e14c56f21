//! Support vector classification on top of linfa-svm

use std::fmt;
use std::ops::Range;

use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::debug;

use crate::error::DataError;
use crate::metrics::{self, ClassificationReport, ConfusionMatrix};

/// Kernel used by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    /// `exp(-gamma * ||x - y||^2)`
    Rbf { gamma: f64 },
    /// `(<x, y> + constant)^degree`
    Polynomial { constant: f64, degree: f64 },
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Linear => write!(f, "linear"),
            Kernel::Rbf { gamma } => write!(f, "rbf (gamma={gamma})"),
            Kernel::Polynomial { constant, degree } => {
                write!(f, "polynomial (c={constant}, degree={degree})")
            }
        }
    }
}

/// Held-out evaluation of a fitted classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierEvaluation {
    pub kernel: Kernel,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
    pub support_vectors: usize,
}

/// Class predictions over a regular grid covering two features
#[derive(Debug, Clone)]
pub struct DecisionGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Row-major by y then x: `classes[iy * xs.len() + ix]`
    pub classes: Vec<bool>,
    pub x_step: f64,
    pub y_step: f64,
}

impl DecisionGrid {
    pub fn class_at(&self, ix: usize, iy: usize) -> bool {
        self.classes[iy * self.xs.len() + ix]
    }
}

/// Fitted C-SVC binary classifier
pub struct SvmClassifier {
    model: Svm<f64, bool>,
    pub kernel: Kernel,
    n_features: usize,
}

impl SvmClassifier {
    /// Fit a C-SVC with equal class weights `c`
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<bool>,
        kernel: Kernel,
        c: f64,
    ) -> crate::Result<Self> {
        if records.nrows() != targets.len() {
            return Err(DataError::DimensionMismatch {
                expected: records.nrows(),
                actual: targets.len(),
            }
            .into());
        }
        if records.nrows() == 0 {
            return Err(DataError::Empty.into());
        }
        if !(c > 0.0) {
            return Err(DataError::InvalidParameter(format!("C must be positive, got {c}")).into());
        }
        let positives = targets.iter().filter(|&&t| t).count();
        if positives == 0 || positives == targets.len() {
            return Err(DataError::SingleClass.into());
        }

        let params = Svm::<f64, bool>::params().pos_neg_weights(c, c);
        let params = match kernel {
            Kernel::Linear => params.linear_kernel(),
            Kernel::Rbf { gamma } => {
                if !(gamma > 0.0) {
                    return Err(DataError::InvalidParameter(format!(
                        "gamma must be positive, got {gamma}"
                    ))
                    .into());
                }
                // linfa's gaussian kernel is exp(-d^2 / eps)
                params.gaussian_kernel(1.0 / gamma)
            }
            Kernel::Polynomial { constant, degree } => params.polynomial_kernel(constant, degree),
        };

        let dataset = Dataset::new(records.clone(), targets.clone());
        let model = params.fit(&dataset)?;

        debug!(%kernel, support_vectors = model.nsupport(), "svm fitted");

        Ok(Self {
            model,
            kernel,
            n_features: records.ncols(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn support_vectors(&self) -> usize {
        self.model.nsupport()
    }

    pub fn predict(&self, records: &Array2<f64>) -> crate::Result<Array1<bool>> {
        if records.ncols() != self.n_features {
            return Err(DataError::DimensionMismatch {
                expected: self.n_features,
                actual: records.ncols(),
            }
            .into());
        }
        Ok(self.model.predict(records))
    }

    /// Classify a single (already scaled) observation
    pub fn predict_point(&self, point: &Array1<f64>) -> crate::Result<bool> {
        let records = point.clone().insert_axis(ndarray::Axis(0));
        Ok(self.predict(&records)?[0])
    }

    /// Accuracy, confusion matrix and classification report on held-out data
    pub fn evaluate(
        &self,
        records: &Array2<f64>,
        truth: &Array1<bool>,
    ) -> crate::Result<ClassifierEvaluation> {
        let predicted = self.predict(records)?;
        let accuracy = metrics::accuracy(&predicted, truth)?;
        let confusion = ConfusionMatrix::from_predictions(&predicted, truth)?;

        Ok(ClassifierEvaluation {
            kernel: self.kernel,
            accuracy,
            report: ClassificationReport::from_confusion(&confusion),
            confusion,
            support_vectors: self.support_vectors(),
        })
    }

    /// Predict every cell centre of a `resolution x resolution` grid
    pub fn decision_grid(
        &self,
        x_range: Range<f64>,
        y_range: Range<f64>,
        resolution: usize,
    ) -> crate::Result<DecisionGrid> {
        if self.n_features != 2 {
            return Err(DataError::DimensionMismatch {
                expected: 2,
                actual: self.n_features,
            }
            .into());
        }
        if resolution == 0 || !(x_range.end > x_range.start) || !(y_range.end > y_range.start) {
            return Err(DataError::InvalidParameter("empty decision grid".to_string()).into());
        }

        let x_step = (x_range.end - x_range.start) / resolution as f64;
        let y_step = (y_range.end - y_range.start) / resolution as f64;
        let xs: Vec<f64> = (0..resolution)
            .map(|i| x_range.start + (i as f64 + 0.5) * x_step)
            .collect();
        let ys: Vec<f64> = (0..resolution)
            .map(|i| y_range.start + (i as f64 + 0.5) * y_step)
            .collect();

        let grid = Array2::from_shape_fn((resolution * resolution, 2), |(row, col)| {
            if col == 0 {
                xs[row % resolution]
            } else {
                ys[row / resolution]
            }
        });
        let classes = self.predict(&grid)?.to_vec();

        Ok(DecisionGrid {
            xs,
            ys,
            classes,
            x_step,
            y_step,
        })
    }
}
