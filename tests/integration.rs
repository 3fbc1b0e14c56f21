//! Integration tests for mlforge

use std::io::Write;

use mlforge::config::{
    AdvancedConfig, ClusteringConfig, SvmConfig, SweepConfig, ADVANCED_FEATURES, KMEANS_FEATURES,
    SVM_FEATURES,
};
use mlforge::data::{load_features, load_labeled};
use mlforge::reduction::project;
use mlforge::{
    run_advanced, run_elbow, run_exploration, run_kmeans, run_silhouette, run_svm,
    train_test_split, DataError, RunOptions, StandardScaler,
};
use ndarray::{Array2, Axis};
use tempfile::NamedTempFile;

/// Social-network ads style data: purchase follows a linear rule on age and salary
fn create_ads_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "User ID,Gender,Age,EstimatedSalary,Purchased").unwrap();

    for i in 0..80u32 {
        let age = 18 + (i * 7) % 43;
        let salary = 15000 + ((i * 37) % 80) * 1700;
        let score = (age as f64 - 18.0) / 42.0 + (salary as f64 - 15000.0) / 135000.0;
        let purchased = u8::from(score > 0.9);
        let gender = if i % 2 == 0 { "Male" } else { "Female" };
        writeln!(file, "{},{gender},{age},{salary},{purchased}", 15600000 + i).unwrap();
    }

    file
}

/// Mall-customer style data: five well separated income/spending groups
fn create_mall_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "CustomerID,Genre,Age,Annual Income (k$),Spending Score (1-100)"
    )
    .unwrap();

    let centers = [(25.0, 20.0), (25.0, 80.0), (55.0, 50.0), (90.0, 20.0), (90.0, 80.0)];
    let mut id = 1;
    for (group, (income, score)) in centers.iter().enumerate() {
        for j in 0..12 {
            let dx = ((j * 3) % 5) as f64 - 2.0;
            let dy = ((j * 2) % 5) as f64 - 2.0;
            let age = 20 + group * 9 + j % 6;
            let genre = if j % 3 == 0 { "Male" } else { "Female" };
            writeln!(file, "{id},{genre},{age},{},{}", income + dx, score + dy).unwrap();
            id += 1;
        }
    }

    file
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn assert_standardized(scaled: &Array2<f64>) {
    let n = scaled.nrows() as f64;
    for col in scaled.axis_iter(Axis(1)) {
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "mean {mean}");
        assert!((var - 1.0).abs() < 1e-9, "variance {var}");
    }
}

#[test]
fn test_exploration() {
    let file = create_mall_csv();
    let report = run_exploration(file.path(), &RunOptions::default()).unwrap();

    assert_eq!(report.rows, 60);
    assert_eq!(report.columns.len(), 5);
    assert_eq!(report.total_nulls, 0);
    assert!(report.plots.is_empty());

    let genre = report.columns.iter().find(|c| c.name == "Genre").unwrap();
    assert!(genre.numeric.is_none());
    let counts: usize = genre.categories.as_ref().unwrap().iter().map(|(_, n)| n).sum();
    assert_eq!(counts, 60);

    let income = report
        .columns
        .iter()
        .find(|c| c.name == "Annual Income (k$)")
        .unwrap();
    let stats = income.numeric.as_ref().unwrap();
    assert_eq!(stats.count, 60);
    assert!(stats.min <= stats.q1 && stats.q1 <= stats.median);
    assert!(stats.median <= stats.q3 && stats.q3 <= stats.max);
}

#[test]
fn test_split_and_scaling_on_ads() {
    let file = create_ads_csv();
    let data = load_labeled(file.path(), &owned(&SVM_FEATURES), "Purchased").unwrap();
    assert_eq!(data.records.shape(), &[80, 2]);

    let split = train_test_split(&data.records, &data.targets, 0.25, 42).unwrap();
    assert_eq!(split.n_train(), 60);
    assert_eq!(split.n_test(), 20);
    assert_eq!(split.n_train() + split.n_test(), 80);

    let scaler = StandardScaler::fit(&split.train_records).unwrap();
    assert_standardized(&scaler.transform(&split.train_records).unwrap());
}

#[test]
fn test_scaling_on_mall() {
    let file = create_mall_csv();
    let data = load_features(file.path(), &owned(&KMEANS_FEATURES)).unwrap();
    let scaler = StandardScaler::fit(&data.records).unwrap();
    assert_standardized(&scaler.transform(&data.records).unwrap());
}

#[test]
fn test_svm_pipeline() {
    let file = create_ads_csv();
    let config = SvmConfig {
        grid_resolution: 20,
        poly_degree: Some(2.0),
        predict: Some(vec![58.0, 140000.0]),
        ..SvmConfig::default()
    };
    let report = run_svm(file.path(), &config, &RunOptions::default()).unwrap();

    assert_eq!(report.total_rows, 80);
    assert_eq!(report.train_rows + report.test_rows, report.total_rows);
    assert_eq!(report.test_rows, 20);

    for eval in [&report.linear, &report.rbf] {
        assert!((0.0..=1.0).contains(&eval.accuracy));
        assert_eq!(eval.confusion.total(), report.test_rows);
        assert_eq!(eval.report.support, report.test_rows);
    }
    assert!(report.linear.accuracy >= 0.8, "linear accuracy {}", report.linear.accuracy);

    let polynomial = report.polynomial.as_ref().unwrap();
    assert!((0.0..=1.0).contains(&polynomial.accuracy));

    assert_eq!(report.gamma_sweep.len(), 3);
    assert!(report
        .gamma_sweep
        .iter()
        .all(|g| (0.0..=1.0).contains(&g.accuracy)));

    // an old, well-paid user sits deep inside the purchase region
    let prediction = report.prediction.unwrap();
    assert!(prediction.linear);
}

#[test]
fn test_svm_is_reproducible() {
    let file = create_ads_csv();
    let config = SvmConfig::default();
    let a = run_svm(file.path(), &config, &RunOptions::default()).unwrap();
    let b = run_svm(file.path(), &config, &RunOptions::default()).unwrap();

    assert_eq!(a.scaler_mean, b.scaler_mean);
    assert_eq!(a.linear.confusion, b.linear.confusion);
    assert_eq!(a.rbf.confusion, b.rbf.confusion);
}

#[test]
fn test_kmeans_pipeline() {
    let file = create_mall_csv();
    let config = ClusteringConfig {
        predict: Some(vec![25.0, 20.0]),
        ..ClusteringConfig::default()
    };
    let report = run_kmeans(file.path(), &config, &RunOptions::default()).unwrap();

    assert_eq!(report.rows, 60);
    assert_eq!(report.clusters.len(), 5);
    assert!(report.clusters.iter().all(|c| c.size == 12));
    assert_eq!(report.centroids.len(), 5);

    let silhouette = report.silhouette.unwrap();
    assert!((-1.0..=1.0).contains(&silhouette));
    assert!(silhouette > 0.7);

    // the predicted cluster is the one whose centroid sits at (25, 20)
    let predicted = report.prediction.unwrap().cluster;
    let centroid = &report.centroids[predicted];
    assert!((centroid[0] - 25.0).abs() < 1.0);
    assert!((centroid[1] - 20.0).abs() < 1.0);
}

#[test]
fn test_kmeans_is_reproducible() {
    let file = create_mall_csv();
    let config = ClusteringConfig::default();
    let a = run_kmeans(file.path(), &config, &RunOptions::default()).unwrap();
    let b = run_kmeans(file.path(), &config, &RunOptions::default()).unwrap();

    assert_eq!(a.wcss, b.wcss);
    assert_eq!(a.centroids, b.centroids);
}

#[test]
fn test_elbow_is_non_increasing() {
    let file = create_mall_csv();
    let report = run_elbow(file.path(), &SweepConfig::elbow(), &RunOptions::default()).unwrap();

    let ks: Vec<usize> = report.points.iter().map(|p| p.k).collect();
    assert_eq!(ks, (1..=10).collect::<Vec<_>>());
    for pair in report.points.windows(2) {
        assert!(
            pair[1].wcss <= pair[0].wcss + 1e-9,
            "WCSS rose from K={} to K={}",
            pair[0].k,
            pair[1].k
        );
    }
}

#[test]
fn test_silhouette_finds_five_groups() {
    let file = create_mall_csv();
    let report =
        run_silhouette(file.path(), &SweepConfig::silhouette(), &RunOptions::default()).unwrap();

    assert_eq!(report.points.first().unwrap().k, 2);
    assert!(report
        .points
        .iter()
        .all(|p| (-1.0..=1.0).contains(&p.score)));
    assert_eq!(report.best_k, Some(5));
}

#[test]
fn test_advanced_pipeline() {
    let file = create_mall_csv();
    let config = AdvancedConfig::default();
    let a = run_advanced(file.path(), &config, &RunOptions::default()).unwrap();
    let b = run_advanced(file.path(), &config, &RunOptions::default()).unwrap();

    assert_eq!(a.rows, 60);
    assert_eq!(a.labels.len(), 60);
    assert!(a.labels.iter().all(|&l| l < 5));
    assert!((-1.0..=1.0).contains(&a.silhouette));
    assert_eq!(a.explained_variance_ratio.len(), 2);
    assert!(a
        .explained_variance_ratio
        .iter()
        .all(|r| (0.0..=1.0).contains(r)));

    assert_eq!(a.labels, b.labels);
    assert_eq!(a.silhouette, b.silhouette);
}

#[test]
fn test_advanced_keeps_leading_components() {
    let file = create_mall_csv();
    let report = run_advanced(file.path(), &AdvancedConfig::default(), &RunOptions::default())
        .unwrap();
    let ratios = &report.explained_variance_ratio;

    // eigenvalue shares of the standardized fixture: 0.6629 / 0.3333 / 0.0039
    assert!(ratios[0] >= ratios[1]);
    assert!((ratios[0] - 0.66286).abs() < 1e-3, "first ratio {}", ratios[0]);
    assert!((ratios[1] - 0.33325).abs() < 1e-3, "second ratio {}", ratios[1]);
    assert!((ratios[0] + ratios[1] - 0.99611).abs() < 1e-3);

    // the truncated projection matches the leading part of the full one
    let data = load_features(file.path(), &owned(&ADVANCED_FEATURES)).unwrap();
    let scaled = StandardScaler::fit(&data.records)
        .unwrap()
        .transform(&data.records)
        .unwrap();
    let full = project(&scaled, 3).unwrap();
    for (truncated, leading) in ratios.iter().zip(&full.explained_variance_ratio) {
        assert!((truncated - leading).abs() < 1e-6);
    }
}

#[test]
fn test_plots_are_written() {
    let file = create_mall_csv();
    let dir = tempfile::tempdir().unwrap();
    let options = RunOptions::with_plots(dir.path().join("plots"));

    let report = run_kmeans(file.path(), &ClusteringConfig::default(), &options).unwrap();
    assert_eq!(report.plots.len(), 2);
    for plot in &report.plots {
        assert!(plot.exists(), "missing {}", plot.display());
    }

    let report = run_elbow(file.path(), &SweepConfig::elbow(), &options).unwrap();
    assert!(report.plots[0].exists());
}

#[test]
fn test_missing_column() {
    let file = create_mall_csv();
    let config = ClusteringConfig {
        features: owned(&["Income"]),
        ..ClusteringConfig::default()
    };
    let err = run_kmeans(file.path(), &config, &RunOptions::default()).unwrap_err();

    match err.downcast_ref::<DataError>() {
        Some(DataError::MissingColumn { column, .. }) => assert_eq!(column, "Income"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_non_binary_target() {
    let file = create_ads_csv();
    let config = SvmConfig {
        target: "Age".to_string(),
        ..SvmConfig::default()
    };
    let err = run_svm(file.path(), &config, &RunOptions::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::InvalidLabel { .. })
    ));
}

#[test]
fn test_too_many_clusters() {
    let file = create_mall_csv();
    let mut config = ClusteringConfig::default();
    config.kmeans.n_clusters = 61;
    assert!(run_kmeans(file.path(), &config, &RunOptions::default()).is_err());
}
