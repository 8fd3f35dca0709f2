use std::fmt::Write;

/// Per-channel summary statistics over an extraction matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    pub max_abs: Vec<f64>,
    pub mean: Vec<f64>,
    pub mean_abs: Vec<f64>,
    pub std: Vec<f64>,
}

impl ChannelStats {
    /// Input must be non-empty and rectangular; the parser enforces both.
    /// `std` is the population standard deviation (divide by N).
    pub fn compute(matrix: &[Vec<f64>]) -> Self {
        let channels = matrix.first().map(|row| row.len()).unwrap_or(0);
        let n = matrix.len() as f64;

        let mut max_abs = vec![0.0f64; channels];
        let mut mean = vec![0.0f64; channels];
        let mut mean_abs = vec![0.0f64; channels];
        for row in matrix {
            for (c, &v) in row.iter().enumerate() {
                max_abs[c] = max_abs[c].max(v.abs());
                mean[c] += v;
                mean_abs[c] += v.abs();
            }
        }
        for c in 0..channels {
            mean[c] /= n;
            mean_abs[c] /= n;
        }

        let mut std = vec![0.0f64; channels];
        for row in matrix {
            for (c, &v) in row.iter().enumerate() {
                let d = v - mean[c];
                std[c] += d * d;
            }
        }
        for c in 0..channels {
            std[c] = (std[c] / n).sqrt();
        }

        Self {
            max_abs,
            mean,
            mean_abs,
            std,
        }
    }

    pub fn channels(&self) -> usize {
        self.max_abs.len()
    }

    /// Fixed-width statistics table printed by the CLI, one row per joint.
    pub fn table(&self, label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[ {label} statistics ]");
        let _ = writeln!(
            out,
            "{:<5} | {:<12} | {:<12} | {:<12} | {:<12}",
            "joint", "max abs", "mean", "mean abs", "std"
        );
        let _ = writeln!(out, "{}", "-".repeat(65));
        for c in 0..self.channels() {
            let _ = writeln!(
                out,
                "{:<5} | {:<12.6} | {:<12.6} | {:<12.6} | {:<12.6}",
                c, self.max_abs[c], self.mean[c], self.mean_abs[c], self.std[c]
            );
        }
        out
    }
}
