use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config TOML
    #[arg(long, default_value = "gaitlog.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a controller log, print per-kind statistics, write one chart per kind
    Analyze {
        /// Path to the controller log file
        #[arg(value_name = "LOG_FILE")]
        log_file: String,

        /// Output directory for charts (overrides config)
        #[arg(long)]
        out_dir: Option<String>,
    },
    /// Inspect a saved episode log: print the reward report and render the figure
    Episode {
        /// Path to a saved episode log (.json or .bin)
        #[arg(value_name = "SAVED_LOG")]
        path: String,
    },
}
