// Entry point: runs the per-kind analysis pipeline or inspects a saved
// episode log.
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;

use gaitlog::analysis::{chart, parser, stats::ChannelStats};
use gaitlog::cli::{Args, Command};
use gaitlog::config::AppConfig;
use gaitlog::episode::logger::EpisodeLogger;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gaitlog=info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load_or_default(&args.config);

    match args.command {
        Command::Analyze { log_file, out_dir } => analyze(&config, &log_file, out_dir),
        Command::Episode { path } => inspect_episode(Path::new(&path)),
    }
}

fn analyze(
    config: &AppConfig,
    log_file: &str,
    out_dir: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let out_dir = PathBuf::from(out_dir.unwrap_or_else(|| config.chart.out_dir.clone()));

    for kind in &config.kinds {
        let matcher = parser::KindMatcher::compile(kind)?;
        let reader = BufReader::new(File::open(log_file)?);
        let extraction = parser::extract(reader, &matcher)?;
        if extraction.is_empty() {
            println!("Warning: no {} data found in {log_file}", kind.name);
            continue;
        }

        let stats = ChannelStats::compute(&extraction.matrix);
        println!("\n{}", stats.table(&kind.label));

        let path = chart::render(
            &out_dir,
            &extraction.steps,
            &extraction.matrix,
            &stats,
            &kind.name,
            &kind.label,
            (config.chart.width, config.chart.height),
        )?;
        println!("{} chart saved to {}", kind.label, path.display());
    }
    Ok(())
}

fn inspect_episode(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut log = EpisodeLogger::new(0.0);
    log.load(path)?;
    print!("{}", log.report_rewards());

    let figure_path = path.with_extension("png");
    // Join here: the process would otherwise exit before the figure lands.
    let handle = log.render_async(&figure_path);
    if handle.join().is_err() {
        return Err("episode figure render thread panicked".into());
    }
    println!("Episode figure saved to {}", figure_path.display());
    Ok(())
}
