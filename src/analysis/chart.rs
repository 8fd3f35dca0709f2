use std::error::Error;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use super::stats::ChannelStats;

/// Draw one line per channel plus horizontal max-abs / mean-abs reference
/// lines, and write `<kind_name>_analysis.png` under `out_dir`.
pub fn render(
    out_dir: &Path,
    steps: &[u64],
    matrix: &[Vec<f64>],
    stats: &ChannelStats,
    kind_name: &str,
    label: &str,
    size: (u32, u32),
) -> Result<PathBuf, Box<dyn Error>> {
    create_dir_all(out_dir)?;
    let out_path = out_dir.join(format!("{kind_name}_analysis.png"));

    let x_max = steps.iter().copied().max().unwrap_or(0) as f64;
    let x_hi = x_max.max(1.0);

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for row in matrix {
        for &v in row {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
    }
    for c in 0..stats.channels() {
        y_max = y_max.max(stats.max_abs[c]).max(stats.mean_abs[c]);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = -1.0;
        y_max = 1.0;
    }
    let pad = (y_max - y_min).abs().max(1e-6) * 0.05;

    let root = BitMapBackend::new(&out_path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{label} Analysis (red dashed: max |x| | blue dashed: mean |x|)"),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f64..x_hi, (y_min - pad)..(y_max + pad))?;

    chart
        .configure_mesh()
        .x_desc("Step Number")
        .y_desc(label)
        .light_line_style(BLACK.mix(0.08))
        .draw()?;

    for c in 0..stats.channels() {
        let color = Palette99::pick(c).to_rgba();
        let points: Vec<(f64, f64)> = steps
            .iter()
            .zip(matrix.iter())
            .map(|(&s, row)| (s as f64, row[c]))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.mix(0.5)))?
            .label(format!("Joint {c}"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.mix(0.5)));

        chart.draw_series(DashedLineSeries::new(
            vec![(0.0, stats.max_abs[c]), (x_hi, stats.max_abs[c])],
            10,
            6,
            RED.mix(0.7).stroke_width(1),
        ))?;
        chart.draw_series(DashedLineSeries::new(
            vec![(0.0, stats.mean_abs[c]), (x_hi, stats.mean_abs[c])],
            4,
            8,
            BLUE.mix(0.7).stroke_width(1),
        ))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    drop(chart);
    drop(root);
    Ok(out_path)
}
