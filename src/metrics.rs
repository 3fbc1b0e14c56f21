//! Evaluation metrics for the classifiers and clusterers

use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;

use crate::error::DataError;

fn check_lengths(predicted: usize, truth: usize) -> crate::Result<()> {
    if predicted != truth {
        return Err(DataError::DimensionMismatch {
            expected: truth,
            actual: predicted,
        }
        .into());
    }
    if truth == 0 {
        return Err(DataError::Empty.into());
    }
    Ok(())
}

/// Fraction of predictions equal to the ground truth
pub fn accuracy<T: PartialEq>(predicted: &Array1<T>, truth: &Array1<T>) -> crate::Result<f64> {
    check_lengths(predicted.len(), truth.len())?;
    let correct = predicted
        .iter()
        .zip(truth.iter())
        .filter(|(p, t)| p == t)
        .count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Binary confusion matrix; rows are the true class, columns the predicted
/// class, negative class first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predicted: &Array1<bool>, truth: &Array1<bool>) -> crate::Result<Self> {
        check_lengths(predicted.len(), truth.len())?;

        let mut cm = Self {
            true_negative: 0,
            false_positive: 0,
            false_negative: 0,
            true_positive: 0,
        };
        for (&p, &t) in predicted.iter().zip(truth.iter()) {
            match (t, p) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }

    /// `[[tn, fp], [fn, tp]]`
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Precision, recall and F1 for a single class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class metrics plus macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
    pub support: usize,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        // (label, correct, predicted as this class, actually this class)
        let per_class = [
            (
                "0",
                cm.true_negative,
                cm.true_negative + cm.false_negative,
                cm.true_negative + cm.false_positive,
            ),
            (
                "1",
                cm.true_positive,
                cm.true_positive + cm.false_positive,
                cm.true_positive + cm.false_negative,
            ),
        ];

        let classes: Vec<ClassMetrics> = per_class
            .iter()
            .map(|&(label, correct, predicted, actual)| {
                let precision = ratio(correct, predicted);
                let recall = ratio(correct, actual);
                ClassMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support: actual,
                }
            })
            .collect();

        let support = cm.total();
        let n = classes.len() as f64;
        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
        };

        let weighted = |value: fn(&ClassMetrics) -> f64| {
            if support == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| value(c) * c.support as f64)
                    .sum::<f64>()
                    / support as f64
            }
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            accuracy: cm.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            support,
        }
    }
}

/// Within-cluster sum of squared distances to the assigned centroid
pub fn wcss(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .filter(|(_, &cluster)| cluster < centroids.nrows())
        .map(|(i, &cluster)| squared_distance(&features.row(i), &centroids.row(cluster)))
        .sum()
}

pub(crate) fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Mean silhouette coefficient over all samples (Euclidean distance)
///
/// A point alone in its cluster scores 0. Requires between 2 and n - 1
/// distinct labels.
pub fn silhouette_score(features: &Array2<f64>, labels: &Array1<usize>) -> crate::Result<f64> {
    let n_samples = features.nrows();
    check_lengths(labels.len(), n_samples)?;

    let n_labels = labels.iter().max().map_or(0, |&m| m + 1);
    let mut sizes = vec![0usize; n_labels];
    for &label in labels.iter() {
        sizes[label] += 1;
    }
    let distinct = sizes.iter().filter(|&&s| s > 0).count();
    if distinct < 2 || distinct > n_samples - 1 {
        return Err(DataError::InvalidParameter(format!(
            "silhouette needs 2..={} distinct labels, got {}",
            n_samples.saturating_sub(1),
            distinct
        ))
        .into());
    }

    let mut silhouette_sum = 0.0;
    let mut distance_sums = vec![0.0; n_labels];

    for i in 0..n_samples {
        let own = labels[i];
        if sizes[own] == 1 {
            continue;
        }

        distance_sums.iter_mut().for_each(|d| *d = 0.0);
        let point = features.row(i);
        for j in 0..n_samples {
            if i != j {
                distance_sums[labels[j]] += euclidean_distance(&point, &features.row(j));
            }
        }

        // a(i): mean distance to the rest of its own cluster
        let a_i = distance_sums[own] / (sizes[own] - 1) as f64;

        // b(i): smallest mean distance to another cluster
        let b_i = distance_sums
            .iter()
            .zip(sizes.iter())
            .enumerate()
            .filter(|&(label, (_, &size))| label != own && size > 0)
            .map(|(_, (&sum, &size))| sum / size as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a_i.max(b_i);
        if denom > 0.0 {
            silhouette_sum += (b_i - a_i) / denom;
        }
    }

    Ok(silhouette_sum / n_samples as f64)
}
