//! Visualization functions using Plotters

use std::ops::Range;
use std::path::Path;

use ndarray::{Array1, Array2};
use plotters::prelude::*;
use tracing::info;

use crate::kmeans::{ClusterModel, ElbowPoint, SilhouettePoint};
use crate::svm::DecisionGrid;

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 10] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
    RGBColor(23, 190, 207),
    RGBColor(188, 189, 34),
];

/// Colors for the negative and positive class
const CLASS_COLORS: [RGBColor; 2] = [RGBColor(214, 39, 40), RGBColor(44, 160, 44)];

fn cluster_color(cluster: usize) -> RGBColor {
    CLUSTER_COLORS[cluster % CLUSTER_COLORS.len()]
}

fn class_color(class: bool) -> RGBColor {
    CLASS_COLORS[usize::from(class)]
}

/// Min..max of the values, widened by `pad` on each side
fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = if max - min > 0.0 { pad * (max - min) } else { 1.0 };
    (min - pad)..(max + pad)
}

/// Bounds used for decision-boundary grids over a two-column matrix
pub fn feature_ranges(records: &Array2<f64>) -> (Range<f64>, Range<f64>) {
    (
        padded_range(records.column(0).iter().copied(), 0.1),
        padded_range(records.column(1).iter().copied(), 0.1),
    )
}

/// Box plot per numeric column, one panel each
pub fn box_plots(columns: &[(String, Vec<f64>)], output_path: &Path) -> crate::Result<()> {
    let panels = columns.len().max(1);
    let root = BitMapBackend::new(output_path, (320 * panels as u32, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    for ((name, values), area) in columns.iter().zip(root.split_evenly((1, panels)).iter()) {
        if values.is_empty() {
            continue;
        }
        let quartiles = Quartiles::new(values);
        let [lower, _, _, _, upper] = quartiles.values();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let lo = (min as f32).min(lower);
        let hi = (max as f32).max(upper);
        let pad = ((hi - lo) * 0.1).max(1.0);

        let axis = [name.as_str()];
        let mut chart = ChartBuilder::on(area)
            .caption(name, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(axis[..].into_segmented(), (lo - pad)..(hi + pad))?;

        chart.configure_mesh().disable_x_mesh().draw()?;

        chart.draw_series(std::iter::once(
            Boxplot::new_vertical(SegmentValue::CenterOf(&axis[0]), &quartiles)
                .width(40)
                .whisker_width(0.6)
                .style(&CLUSTER_COLORS[1]),
        ))?;

        // points beyond the whiskers
        chart.draw_series(
            values
                .iter()
                .map(|&v| v as f32)
                .filter(|&v| v < lower || v > upper)
                .map(|v| Circle::new((SegmentValue::CenterOf(&axis[0]), v), 3, BLACK.filled())),
        )?;
    }

    root.present()?;
    info!("Box plots saved to: {}", output_path.display());
    Ok(())
}

/// Decision regions of a two-feature classifier with labelled points on top
pub fn decision_boundary(
    grid: &DecisionGrid,
    records: &Array2<f64>,
    targets: &Array1<bool>,
    axis_labels: (&str, &str),
    title: &str,
    output_path: &Path,
) -> crate::Result<()> {
    let half_x = grid.x_step / 2.0;
    let half_y = grid.y_step / 2.0;
    let x_range = (grid.xs[0] - half_x)..(grid.xs[grid.xs.len() - 1] + half_x);
    let y_range = (grid.ys[0] - half_y)..(grid.ys[grid.ys.len() - 1] + half_y);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(axis_labels.0)
        .y_desc(axis_labels.1)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(grid.ys.iter().enumerate().flat_map(|(iy, &y)| {
        grid.xs.iter().enumerate().map(move |(ix, &x)| {
            let color = class_color(grid.class_at(ix, iy)).mix(0.25);
            Rectangle::new(
                [(x - half_x, y - half_y), (x + half_x, y + half_y)],
                color.filled(),
            )
        })
    }))?;

    for class in [false, true] {
        let color = class_color(class);
        chart
            .draw_series(
                records
                    .outer_iter()
                    .zip(targets.iter())
                    .filter(|(_, &t)| t == class)
                    .map(|(row, _)| Circle::new((row[0], row[1]), 4, color.filled())),
            )?
            .label(if class { "1" } else { "0" })
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!("Decision boundary saved to: {}", output_path.display());
    Ok(())
}

/// Scatter of the first two columns of `points`, colored by cluster, with
/// centroids drawn as squares
pub fn cluster_scatter(
    points: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: Option<&Array2<f64>>,
    axis_labels: (&str, &str),
    title: &str,
    output_path: &Path,
) -> crate::Result<()> {
    let x_range = padded_range(points.column(0).iter().copied(), 0.05);
    let y_range = padded_range(points.column(1).iter().copied(), 0.05);
    let marker = 0.015 * (x_range.end - x_range.start).max(y_range.end - y_range.start);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(axis_labels.0)
        .y_desc(axis_labels.1)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        points
            .outer_iter()
            .zip(labels.iter())
            .map(|(row, &cluster)| {
                Circle::new((row[0], row[1]), 4, cluster_color(cluster).filled())
            }),
    )?;

    if let Some(centroids) = centroids {
        for (cluster_id, centroid) in centroids.outer_iter().enumerate() {
            let color = cluster_color(cluster_id);
            let (cx, cy) = (centroid[0], centroid[1]);

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(cx - marker, cy - marker), (cx + marker, cy + marker)],
                    ShapeStyle::from(&BLACK).stroke_width(2),
                )))?
                .label(format!("Cluster {}", cluster_id))
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    info!("Cluster scatter saved to: {}", output_path.display());
    Ok(())
}

/// 3D scatter of the first three columns of `points`, colored by cluster
pub fn cluster_scatter_3d(
    points: &Array2<f64>,
    labels: &Array1<usize>,
    title: &str,
    output_path: &Path,
) -> crate::Result<()> {
    let x_range = padded_range(points.column(0).iter().copied(), 0.05);
    let y_range = padded_range(points.column(1).iter().copied(), 0.05);
    let z_range = padded_range(points.column(2).iter().copied(), 0.05);

    let root = BitMapBackend::new(output_path, (800, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(20)
        .build_cartesian_3d(x_range, y_range, z_range)?;

    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.3;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(3)
        .draw()?;

    chart.draw_series(points.outer_iter().zip(labels.iter()).map(|(row, &cluster)| {
        Circle::new((row[0], row[1], row[2]), 3, cluster_color(cluster).filled())
    }))?;

    root.present()?;
    info!("3D scatter saved to: {}", output_path.display());
    Ok(())
}

/// WCSS against K
pub fn elbow_curve(points: &[ElbowPoint], output_path: &Path) -> crate::Result<()> {
    let series: Vec<(f64, f64)> = points.iter().map(|p| (p.k as f64, p.wcss)).collect();
    line_chart(&series, "Elbow Method", "Number of clusters (K)", "WCSS", output_path)
}

/// Silhouette score against K
pub fn silhouette_curve(points: &[SilhouettePoint], output_path: &Path) -> crate::Result<()> {
    let series: Vec<(f64, f64)> = points.iter().map(|p| (p.k as f64, p.score)).collect();
    line_chart(
        &series,
        "Silhouette Analysis",
        "Number of clusters (K)",
        "Silhouette score",
        output_path,
    )
}

fn line_chart(
    series: &[(f64, f64)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
    output_path: &Path,
) -> crate::Result<()> {
    let x_range = padded_range(series.iter().map(|p| p.0), 0.05);
    let y_range = padded_range(series.iter().map(|p| p.1), 0.1);

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let color = CLUSTER_COLORS[1];
    chart.draw_series(LineSeries::new(series.iter().copied(), color.stroke_width(2)))?;
    chart.draw_series(series.iter().map(|&(x, y)| Circle::new((x, y), 4, color.filled())))?;

    root.present()?;
    info!("{} saved to: {}", title, output_path.display());
    Ok(())
}

/// Bar chart of cluster sizes
pub fn cluster_size_chart(model: &ClusterModel, output_path: &Path) -> crate::Result<()> {
    let cluster_sizes = model.cluster_sizes();
    let max_size = *cluster_sizes.iter().max().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cluster Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(model.n_clusters as f64 - 0.5), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Cluster ID")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(cluster_sizes.iter().enumerate().map(|(cluster_id, &size)| {
        Rectangle::new(
            [(cluster_id as f64 - 0.4, 0.0), (cluster_id as f64 + 0.4, size as f64)],
            cluster_color(cluster_id).filled(),
        )
    }))?;

    root.present()?;
    info!("Cluster size chart saved to: {}", output_path.display());
    Ok(())
}
