//! supply-dash - supply-chain KPI and summary report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, bad config, schema mismatch, etc.)

mod cli;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use cli::Args;
use supply_chain_analytics::config::DEFAULT_CONFIG_FILE;
use supply_chain_analytics::{frame, Analyzer, Config, DashboardReport, OutputFormat};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("supply-dash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Report failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle --init-config: generate a default supply-dash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{DEFAULT_CONFIG_FILE} already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {DEFAULT_CONFIG_FILE}"))?;

    println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
    Ok(())
}

/// `RUST_LOG` wins over -v/-q when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_default()
            .context("Failed to load default config")?
            .unwrap_or_default(),
    };
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    let mut config = load_config(args)?;
    args.merge_into(&mut config);
    debug!(?config, "effective configuration");

    let data_path = PathBuf::from(&config.data.path);
    let df = frame::read_supply_csv(&data_path)
        .with_context(|| format!("Failed to load {}", data_path.display()))?;
    let rows = frame::rows_from_frame(&df)?;

    let analyzer = Analyzer::new(&rows, &config.filters).context("Invalid filters")?;
    if analyzer.is_empty() {
        warn!("No rows match the active filters");
    }

    let report = DashboardReport::build(
        &config.data.path,
        rows.len(),
        &config.filters,
        &analyzer,
        &config.report.views,
    )?;

    match config.report.format {
        OutputFormat::Json => println!("{}", report.to_json()),
        OutputFormat::Table => print!("{}", report.to_table()),
    }

    if let Some(path) = &args.export {
        let mut out = analyzer.frame().clone();
        frame::write_csv(&mut out, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = out.height(), "exported enriched rows");
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "done");
    Ok(())
}
