//! Human-readable rendering of the pipeline reports

use std::fmt;
use std::path::PathBuf;

use crate::metrics::{ClassificationReport, ConfusionMatrix};
use crate::pipeline::{
    AdvancedReport, ClusterProfile, ElbowReport, ExplorationReport, KMeansReport,
    SilhouetteReport, SvmReport,
};
use crate::svm::ClassifierEvaluation;

fn join(values: &[f64], precision: usize) -> String {
    values
        .iter()
        .map(|v| format!("{v:.precision$}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_plots(f: &mut fmt::Formatter<'_>, plots: &[PathBuf]) -> fmt::Result {
    if plots.is_empty() {
        return Ok(());
    }
    writeln!(f, "\nPlots:")?;
    for plot in plots {
        writeln!(f, "  {}", plot.display())?;
    }
    Ok(())
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [negative, positive] = self.as_rows();
        writeln!(f, "              pred 0  pred 1")?;
        writeln!(f, "  actual 0  {:>7} {:>7}", negative[0], negative[1])?;
        write!(f, "  actual 1  {:>7} {:>7}", positive[0], positive[1])
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ClassifierEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- SVM, {} kernel ---", self.kernel)?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Support vectors: {}", self.support_vectors)?;
        writeln!(f, "Confusion matrix:")?;
        writeln!(f, "{}", self.confusion)?;
        write!(f, "{}", self.report)
    }
}

impl fmt::Display for ExplorationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Data Exploration: {} ===", self.source.display())?;
        writeln!(f, "Rows: {}  Columns: {}", self.rows, self.columns.len())?;
        writeln!(f, "\nMissing values per column:")?;
        for column in &self.columns {
            writeln!(f, "  {:<28} {:>6}  ({})", column.name, column.nulls, column.dtype)?;
        }
        writeln!(f, "  {:<28} {:>6}", "total", self.total_nulls)?;

        writeln!(f, "\nNumeric columns:")?;
        writeln!(
            f,
            "  {:<28} {:>6} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11} {:>11}",
            "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for column in &self.columns {
            if let Some(s) = &column.numeric {
                writeln!(
                    f,
                    "  {:<28} {:>6} {:>11.2} {:>11.2} {:>11.2} {:>11.2} {:>11.2} {:>11.2} {:>11.2}",
                    column.name, s.count, s.mean, s.std, s.min, s.q1, s.median, s.q3, s.max
                )?;
            }
        }

        for column in &self.columns {
            if let Some(categories) = &column.categories {
                writeln!(f, "\nValue counts for {}:", column.name)?;
                for (value, count) in categories {
                    writeln!(f, "  {value:<20} {count:>6}")?;
                }
            }
        }

        write_plots(f, &self.plots)
    }
}

impl fmt::Display for SvmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SVM Classification ===")?;
        writeln!(
            f,
            "Features: {}  Target: {}",
            self.config.features.join(", "),
            self.config.target
        )?;
        writeln!(
            f,
            "Rows: {} (train {}, test {})",
            self.total_rows, self.train_rows, self.test_rows
        )?;
        writeln!(f, "Scaler mean: [{}]", join(&self.scaler_mean, 3))?;
        writeln!(f, "Scaler std:  [{}]", join(&self.scaler_scale, 3))?;
        writeln!(f, "C: {}\n", self.config.c)?;

        writeln!(f, "{}", self.linear)?;
        writeln!(f, "{}", self.rbf)?;
        if let Some(polynomial) = &self.polynomial {
            writeln!(f, "{polynomial}")?;
        }

        if !self.gamma_sweep.is_empty() {
            writeln!(f, "--- RBF gamma comparison ---")?;
            for eval in &self.gamma_sweep {
                writeln!(
                    f,
                    "  gamma = {:<8} accuracy = {:.4}  support vectors = {}",
                    eval.gamma, eval.accuracy, eval.support_vectors
                )?;
            }
        }

        if let Some(p) = &self.prediction {
            writeln!(f, "\n--- Prediction ---")?;
            writeln!(f, "Input:  [{}]", join(&p.input, 2))?;
            writeln!(f, "Scaled: [{}]", join(&p.scaled, 3))?;
            writeln!(f, "Linear kernel: {}", u8::from(p.linear))?;
            writeln!(f, "RBF kernel:    {}", u8::from(p.rbf))?;
        }

        write_plots(f, &self.plots)
    }
}

fn write_profiles(
    f: &mut fmt::Formatter<'_>,
    feature_names: &[String],
    clusters: &[ClusterProfile],
) -> fmt::Result {
    writeln!(f, "\n=== Cluster Statistics ===")?;
    for profile in clusters {
        writeln!(
            f,
            "Cluster {}: {} points ({:.1}%)",
            profile.cluster,
            profile.size,
            profile.share * 100.0
        )?;
        for (name, mean) in feature_names.iter().zip(&profile.feature_means) {
            writeln!(f, "    mean {name}: {mean:.2}")?;
        }
    }
    Ok(())
}

impl fmt::Display for KMeansReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== K-Means Clustering (K = {}) ===", self.kmeans.n_clusters)?;
        writeln!(f, "Features: {}", self.feature_names.join(", "))?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f, "Within-cluster sum of squares: {:.4}", self.wcss)?;
        match self.silhouette {
            Some(score) => writeln!(f, "Silhouette score: {score:.4}")?,
            None => writeln!(f, "Silhouette score: n/a")?,
        }

        write_profiles(f, &self.feature_names, &self.clusters)?;

        writeln!(f, "\nCentroids (original units):")?;
        for (i, centroid) in self.centroids.iter().enumerate() {
            writeln!(f, "  {i}: [{}]", join(centroid, 2))?;
        }

        if let Some(p) = &self.prediction {
            writeln!(f, "\nPredicted cluster for [{}]: {}", join(&p.input, 2), p.cluster)?;
        }

        write_plots(f, &self.plots)
    }
}

impl fmt::Display for ElbowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Elbow Method ===")?;
        writeln!(f, "Features: {}", self.feature_names.join(", "))?;
        writeln!(f, "{:>4} {:>14}", "K", "WCSS")?;
        for point in &self.points {
            writeln!(f, "{:>4} {:>14.4}", point.k, point.wcss)?;
        }
        write_plots(f, &self.plots)
    }
}

impl fmt::Display for SilhouetteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Silhouette Analysis ===")?;
        writeln!(f, "Features: {}", self.feature_names.join(", "))?;
        writeln!(f, "{:>4} {:>10}", "K", "score")?;
        for point in &self.points {
            let marker = if Some(point.k) == self.best_k { "  <- best" } else { "" };
            writeln!(f, "{:>4} {:>10.4}{marker}", point.k, point.score)?;
        }
        write_plots(f, &self.plots)
    }
}

impl fmt::Display for AdvancedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== PCA + K-Means (K = {}) ===", self.kmeans.n_clusters)?;
        writeln!(f, "Features: {}", self.feature_names.join(", "))?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(
            f,
            "Explained variance ratio: [{}] (total {:.4})",
            join(&self.explained_variance_ratio, 4),
            self.explained_variance_ratio.iter().sum::<f64>()
        )?;
        writeln!(f, "Within-cluster sum of squares: {:.4}", self.wcss)?;
        writeln!(f, "Silhouette score: {:.4}", self.silhouette)?;

        write_profiles(f, &self.feature_names, &self.clusters)?;
        write_plots(f, &self.plots)
    }
}
