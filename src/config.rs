use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One extractable data kind: a regex with a single capture group holding the
/// ", "-separated numeric list, plus the label used for tables and charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataKind {
    pub name: String,
    pub pattern: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "ChartConfig::default_out_dir")]
    pub out_dir: String,
    #[serde(default = "ChartConfig::default_width")]
    pub width: u32,
    #[serde(default = "ChartConfig::default_height")]
    pub height: u32,
}

impl ChartConfig {
    fn default_out_dir() -> String {
        "output".to_string()
    }
    fn default_width() -> u32 {
        1600
    }
    fn default_height() -> u32 {
        900
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "AppConfig::default_kinds")]
    pub kinds: Vec<DataKind>,
    #[serde(default)]
    pub chart: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            kinds: Self::default_kinds(),
            chart: ChartConfig::default(),
        }
    }
}

impl AppConfig {
    fn default_kinds() -> Vec<DataKind> {
        vec![
            DataKind {
                name: "torque".to_string(),
                pattern: r"Output Torque: \[([-\d\., ]+)\]".to_string(),
                label: "Torque (Nm)".to_string(),
            },
            DataKind {
                name: "action".to_string(),
                pattern: r"Actions\[0 ~ 11\] --> joint_target: \[([-\d\., ]+)\]".to_string(),
                label: "Action".to_string(),
            },
        ]
    }

    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, text) {
                    eprintln!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => {
                eprintln!("Failed to serialize default config: {err}");
            }
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "gaitlog_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.kinds.len(), 2);
        assert_eq!(cfg.kinds[0].name, "torque");
        assert_eq!(cfg.kinds[0].label, "Torque (Nm)");
        assert_eq!(cfg.kinds[1].name, "action");
        assert_eq!(cfg.chart.out_dir, "output");
        assert_eq!(cfg.chart.width, 1600);
        assert_eq!(cfg.chart.height, 900);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let path_str = path.to_string_lossy().to_string();
        let custom = AppConfig {
            kinds: vec![DataKind {
                name: "velocity".to_string(),
                pattern: r"Joint Velocity: \[([-\d\., ]+)\]".to_string(),
                label: "Velocity (rad/s)".to_string(),
            }],
            chart: ChartConfig {
                out_dir: "plots".to_string(),
                width: 800,
                height: 600,
            },
        };
        let text = toml::to_string_pretty(&custom).unwrap();
        fs::write(&path, text).unwrap();

        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.kinds.len(), 1);
        assert_eq!(cfg.kinds[0].name, "velocity");
        assert_eq!(cfg.kinds[0].pattern, r"Joint Velocity: \[([-\d\., ]+)\]");
        assert_eq!(cfg.chart.out_dir, "plots");
        assert_eq!(cfg.chart.width, 800);
        assert_eq!(cfg.chart.height, 600);

        let _ = fs::remove_file(&path);
    }
}
