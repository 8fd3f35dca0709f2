use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};

use super::figure::{self, EpisodeSnapshot};
use super::store::{self, Format, StoreError};

/// One recorded observation: a scalar or a fixed-size vector.
///
/// The `From` conversions are the seam through which values enter the log:
/// anything convertible into a `Sample` has by construction been materialized
/// to plain host floats, so persistence needs no further normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Sample {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Sample::Scalar(v) => Some(*v),
            Sample::Vector(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Sample::Scalar(_) => 1,
            Sample::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component `i`, treating a scalar as a one-element vector.
    pub fn component(&self, i: usize) -> Option<f64> {
        match self {
            Sample::Scalar(v) => (i == 0).then_some(*v),
            Sample::Vector(v) => v.get(i).copied(),
        }
    }
}

impl From<f64> for Sample {
    fn from(v: f64) -> Self {
        Sample::Scalar(v)
    }
}

impl From<f32> for Sample {
    fn from(v: f32) -> Self {
        Sample::Scalar(v as f64)
    }
}

impl From<Vec<f64>> for Sample {
    fn from(v: Vec<f64>) -> Self {
        Sample::Vector(v)
    }
}

impl From<Vec<f32>> for Sample {
    fn from(v: Vec<f32>) -> Self {
        Sample::Vector(v.into_iter().map(f64::from).collect())
    }
}

impl From<&[f64]> for Sample {
    fn from(v: &[f64]) -> Self {
        Sample::Vector(v.to_vec())
    }
}

impl From<&[f32]> for Sample {
    fn from(v: &[f32]) -> Self {
        Sample::Vector(v.iter().map(|&x| f64::from(x)).collect())
    }
}

/// Accumulates named state and reward series over one simulation run.
///
/// Not synchronized: record calls belong on a single thread. A render task
/// spawned by [`render_async`](Self::render_async) works from its own snapshot
/// and never observes later mutation.
pub struct EpisodeLogger {
    pub dt: f64,
    pub state_log: HashMap<String, Vec<Sample>>,
    pub rew_log: HashMap<String, Vec<f64>>,
    pub num_episodes: u64,
    render_cancel: Arc<AtomicBool>,
}

impl EpisodeLogger {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            state_log: HashMap::new(),
            rew_log: HashMap::new(),
            num_episodes: 0,
            render_cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Append one observation to the named series, creating it on first use.
    pub fn record_state(&mut self, name: &str, value: impl Into<Sample>) {
        self.state_log
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    pub fn record_states<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Sample>,
    {
        for (name, value) in entries {
            self.state_log
                .entry(name.into())
                .or_default()
                .push(value.into());
        }
    }

    /// Append `value * episodes` for every reward-named entry (key contains
    /// "rew"); other entries are ignored. `episodes` accumulates into
    /// `num_episodes` either way.
    pub fn record_rewards(&mut self, rewards: &HashMap<String, f64>, episodes: u64) {
        for (key, &value) in rewards {
            if key.contains("rew") {
                self.rew_log
                    .entry(key.clone())
                    .or_default()
                    .push(value * episodes as f64);
            }
        }
        self.num_episodes += episodes;
    }

    /// Clear both series maps; `dt` and `num_episodes` are untouched.
    pub fn reset(&mut self) {
        self.state_log.clear();
        self.rew_log.clear();
    }

    /// Spawn a thread rendering the nine-panel figure to `out_path` from a
    /// snapshot of the current series. The logger may keep mutating; the task
    /// sees only the snapshot. The handle may be joined or dropped; dropping
    /// the logger signals cancellation to outstanding tasks without joining.
    pub fn render_async(&self, out_path: impl Into<PathBuf>) -> JoinHandle<()> {
        let snapshot = EpisodeSnapshot {
            dt: self.dt,
            state_log: self.state_log.clone(),
        };
        figure::spawn(snapshot, out_path.into(), self.render_cancel.clone())
    }

    /// Per-series `sum(values) / num_episodes` plus the total episode count.
    /// Zero episodes is a usage error and yields a non-finite average.
    pub fn report_rewards(&self) -> String {
        let mut out = String::from("Average rewards per second:\n");
        let mut keys: Vec<&String> = self.rew_log.keys().collect();
        keys.sort();
        for key in keys {
            let sum: f64 = self.rew_log[key].iter().sum();
            let mean = sum / self.num_episodes as f64;
            out.push_str(&format!(" - {key}: {mean}\n"));
        }
        out.push_str(&format!("Total number of episodes: {}\n", self.num_episodes));
        out
    }

    pub fn save(&self, name: &str, format: Format, dir: &Path) -> Result<PathBuf, StoreError> {
        store::save(self, name, format, dir)
    }

    /// Replace `dt`, both series maps, and `num_episodes` with the file's
    /// content; the format is inferred from the file suffix.
    pub fn load(&mut self, path: &Path) -> Result<(), StoreError> {
        let data = store::load(path)?;
        self.dt = data.dt;
        self.state_log = data.state_log;
        self.rew_log = data.rew_log;
        self.num_episodes = data.num_episodes;
        Ok(())
    }
}

impl Drop for EpisodeLogger {
    fn drop(&mut self) {
        // Best-effort: tell any outstanding render task to stop. No join.
        self.render_cancel.store(true, Ordering::SeqCst);
    }
}
