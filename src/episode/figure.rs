// Nine-panel episode diagnostic figure, rendered on a background thread from
// an immutable snapshot of the logger's series.
use std::collections::HashMap;
use std::error::Error;
use std::fs::create_dir_all;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, warn};

use super::logger::Sample;

/// The series mappings at the moment a render task is launched; later logger
/// mutations are not reflected.
#[derive(Debug, Clone)]
pub struct EpisodeSnapshot {
    pub dt: f64,
    pub state_log: HashMap<String, Vec<Sample>>,
}

impl EpisodeSnapshot {
    /// Time series for a scalar-valued key; vector samples contribute their
    /// first component.
    fn scalar_points(&self, key: &str) -> Vec<(f64, f64)> {
        self.state_log
            .get(key)
            .map(|samples| {
                samples
                    .iter()
                    .enumerate()
                    .filter_map(|(i, s)| s.component(0).map(|v| (i as f64 * self.dt, v)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn scalar_values(&self, key: &str) -> Vec<f64> {
        self.state_log
            .get(key)
            .map(|samples| samples.iter().filter_map(|s| s.component(0)).collect())
            .unwrap_or_default()
    }

    /// One time series per vector component for a vector-valued key.
    fn vector_columns(&self, key: &str) -> Vec<Vec<(f64, f64)>> {
        let Some(samples) = self.state_log.get(key) else {
            return Vec::new();
        };
        let width = samples.iter().map(Sample::len).max().unwrap_or(0);
        (0..width)
            .map(|c| {
                samples
                    .iter()
                    .enumerate()
                    .filter_map(|(i, s)| s.component(c).map(|v| (i as f64 * self.dt, v)))
                    .collect()
            })
            .collect()
    }
}

struct Series {
    label: String,
    points: Vec<(f64, f64)>,
}

pub fn spawn(
    snapshot: EpisodeSnapshot,
    out_path: PathBuf,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("episode-figure".into())
        .spawn(move || match render(&snapshot, &out_path, &cancel) {
            Ok(()) => debug!("episode figure written to {}", out_path.display()),
            Err(err) => warn!("episode figure render failed: {err}"),
        })
        .expect("spawn episode-figure")
}

/// Render all nine panels. The cancel flag is polled between panels; a
/// cancelled render returns without presenting the incomplete figure.
pub fn render(
    snapshot: &EpisodeSnapshot,
    out_path: &Path,
    cancel: &AtomicBool,
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = out_path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }

    let root = BitMapBackend::new(out_path, (1800, 1350)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 3));

    let line_panels: [(usize, &str, &str, &[(&str, &str)]); 6] = [
        (
            0,
            "Base velocity x",
            "base lin vel [m/s]",
            &[("measured", "base_vel_x"), ("commanded", "command_x")],
        ),
        (
            1,
            "Base velocity y",
            "base lin vel [m/s]",
            &[("measured", "base_vel_y"), ("commanded", "command_y")],
        ),
        (
            2,
            "Base velocity yaw",
            "base ang vel [rad/s]",
            &[("measured", "base_vel_yaw"), ("commanded", "command_yaw")],
        ),
        (
            3,
            "DOF Position",
            "Position [rad]",
            &[("measured", "dof_pos"), ("target", "dof_pos_target")],
        ),
        (
            4,
            "Joint Velocity",
            "Velocity [rad/s]",
            &[("measured", "dof_vel"), ("target", "dof_vel_target")],
        ),
        (5, "Base velocity z", "base lin vel [m/s]", &[("measured", "base_vel_z")]),
    ];

    for (idx, caption, y_desc, keys) in line_panels {
        let series: Vec<Series> = keys
            .iter()
            .map(|(label, key)| Series {
                label: label.to_string(),
                points: snapshot.scalar_points(key),
            })
            .filter(|s| !s.points.is_empty())
            .collect();
        line_panel(&panels[idx], caption, "time [s]", y_desc, &series)?;
        if cancel.load(Ordering::Relaxed) {
            return Ok(());
        }
    }

    let force_series: Vec<Series> = snapshot
        .vector_columns("contact_forces_z")
        .into_iter()
        .enumerate()
        .map(|(i, points)| Series {
            label: format!("force {i}"),
            points,
        })
        .filter(|s| !s.points.is_empty())
        .collect();
    line_panel(
        &panels[6],
        "Vertical Contact forces",
        "time [s]",
        "Forces z [N]",
        &force_series,
    )?;
    if cancel.load(Ordering::Relaxed) {
        return Ok(());
    }

    let vel = snapshot.scalar_values("dof_vel");
    let torque = snapshot.scalar_values("dof_torque");
    let curve_points: Vec<(f64, f64)> = vel
        .iter()
        .zip(torque.iter())
        .map(|(&v, &t)| (v, t))
        .collect();
    scatter_panel(
        &panels[7],
        "Torque/velocity curves",
        "Joint vel [rad/s]",
        "Joint Torque [Nm]",
        &curve_points,
    )?;
    if cancel.load(Ordering::Relaxed) {
        return Ok(());
    }

    let torque_series: Vec<Series> = [Series {
        label: "measured".to_string(),
        points: snapshot.scalar_points("dof_torque"),
    }]
    .into_iter()
    .filter(|s| !s.points.is_empty())
    .collect();
    line_panel(
        &panels[8],
        "Torque",
        "time [s]",
        "Joint Torque [Nm]",
        &torque_series,
    )?;

    root.present()?;
    Ok(())
}

fn line_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[Series],
) -> Result<(), Box<dyn Error>> {
    let (x_range, y_range) = ranges(series.iter().flat_map(|s| s.points.iter().copied()));
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color))?
            .label(s.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
    }
    if !series.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn scatter_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
) -> Result<(), Box<dyn Error>> {
    let (x_range, y_range) = ranges(points.iter().copied());
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 18))
        .margin(8)
        .x_label_area_size(28)
        .y_label_area_size(48)
        .build_cartesian_2d(x_range, y_range)?;
    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    if !points.is_empty() {
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, BLUE.filled())),
            )?
            .label("measured")
            .legend(|(x, y)| Circle::new((x + 8, y), 2, BLUE.filled()));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn ranges(points: impl Iterator<Item = (f64, f64)>) -> (Range<f64>, Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (x, y) in points {
        if x.is_finite() {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
        }
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !x_min.is_finite() || !x_max.is_finite() {
        x_min = 0.0;
        x_max = 1.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = -1.0;
        y_max = 1.0;
    }
    let x_pad = (x_max - x_min).abs().max(1e-6) * 0.02;
    let y_pad = (y_max - y_min).abs().max(1e-6) * 0.05;
    (
        (x_min - x_pad)..(x_max + x_pad),
        (y_min - y_pad)..(y_max + y_pad),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(dt: f64, entries: &[(&str, Vec<Sample>)]) -> EpisodeSnapshot {
        let mut state_log = HashMap::new();
        for (key, samples) in entries {
            state_log.insert(key.to_string(), samples.clone());
        }
        EpisodeSnapshot { dt, state_log }
    }

    #[test]
    fn scalar_points_use_the_time_axis() {
        let snap = snapshot_with(
            0.5,
            &[(
                "dof_pos",
                vec![Sample::Scalar(1.0), Sample::Scalar(2.0), Sample::Scalar(3.0)],
            )],
        );
        let points = snap.scalar_points("dof_pos");
        assert_eq!(points, vec![(0.0, 1.0), (0.5, 2.0), (1.0, 3.0)]);
    }

    #[test]
    fn missing_series_yield_no_points() {
        let snap = snapshot_with(0.1, &[]);
        assert!(snap.scalar_points("dof_pos").is_empty());
        assert!(snap.vector_columns("contact_forces_z").is_empty());
    }

    #[test]
    fn vector_columns_split_per_component() {
        let snap = snapshot_with(
            1.0,
            &[(
                "contact_forces_z",
                vec![
                    Sample::Vector(vec![10.0, 20.0]),
                    Sample::Vector(vec![11.0, 21.0]),
                ],
            )],
        );
        let columns = snap.vector_columns("contact_forces_z");
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], vec![(0.0, 10.0), (1.0, 11.0)]);
        assert_eq!(columns[1], vec![(0.0, 20.0), (1.0, 21.0)]);
    }
}
