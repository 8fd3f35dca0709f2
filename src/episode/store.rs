// Persistence for episode logs: JSON is the portable text format, bincode the
// native binary one.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::logger::{EpisodeLogger, Sample};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported log format '{0}' (expected json or bin)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode: {0}")]
    Bin(#[from] bincode::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Bin,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Bin => "bin",
        }
    }

    /// Infer the format from a file suffix; anything else is a usage error.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("bin") => Ok(Format::Bin),
            other => Err(StoreError::UnsupportedFormat(
                other.unwrap_or("").to_string(),
            )),
        }
    }
}

/// On-disk payload, identical in both formats. Samples are plain host floats
/// by the time they reach the logger, so no conversion happens here.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedLog {
    pub dt: f64,
    pub state_log: HashMap<String, Vec<Sample>>,
    pub rew_log: HashMap<String, Vec<f64>>,
    pub num_episodes: u64,
}

pub fn save(
    log: &EpisodeLogger,
    name: &str,
    format: Format,
    dir: &Path,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.{}", format.extension()));
    let payload = PersistedLog {
        dt: log.dt,
        state_log: log.state_log.clone(),
        rew_log: log.rew_log.clone(),
        num_episodes: log.num_episodes,
    };
    match format {
        Format::Json => fs::write(&path, serde_json::to_vec_pretty(&payload)?)?,
        Format::Bin => fs::write(&path, bincode::serialize(&payload)?)?,
    }
    info!("saved episode log to {}", path.display());
    Ok(path)
}

pub fn load(path: &Path) -> Result<PersistedLog, StoreError> {
    let format = Format::from_path(path)?;
    let bytes = fs::read(path)?;
    let payload = match format {
        Format::Json => serde_json::from_slice(&bytes)?,
        Format::Bin => bincode::deserialize(&bytes)?,
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/run.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("run.bin")).unwrap(), Format::Bin);
        assert!(matches!(
            Format::from_path(Path::new("run.pkl")),
            Err(StoreError::UnsupportedFormat(ext)) if ext == "pkl"
        ));
        assert!(matches!(
            Format::from_path(Path::new("no_suffix")),
            Err(StoreError::UnsupportedFormat(_))
        ));
    }
}
