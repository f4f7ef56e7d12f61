use anyhow::Result;
use clap::{Parser, Subcommand};
use filmdepot::config::{AppConfig, CliConfig, FileConfig, DEFAULT_CHUNK_SIZE};
use filmdepot::pipeline::{Pipeline, RowErrorPolicy, StageResult, STAGES};
use filmdepot::warehouse::WarehouseStore;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
#[clap(version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")))]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing the source dataset files.
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite warehouse database file. Defaults to
    /// warehouse.db inside the data directory.
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Number of source records per read chunk and write transaction.
    #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// What to do when a single source row fails normalization.
    #[clap(long, value_enum, default_value_t = RowErrorPolicy::Skip)]
    pub on_row_error: RowErrorPolicy,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every stage in dependency order.
    RunAll,
    /// Run a single stage. Its prerequisites must have committed earlier
    /// in the same invocation, so most stages only run via run-all.
    RunStage { name: String },
    /// Print the stages in execution order with their prerequisites.
    ListStages,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            data_dir: args.data_dir.clone(),
            warehouse_db: args.db.clone(),
            chunk_size: args.chunk_size,
            on_row_error: args.on_row_error,
        }
    }
}

fn report(results: &[StageResult]) {
    let mut total_written = 0;
    let mut total_failed = 0;
    for result in results {
        total_written += result.total_written();
        total_failed += result.rows_failed;
        info!(
            "{}: {} rows written, {} failed, {:?}",
            result.name,
            result.total_written(),
            result.rows_failed,
            result.elapsed,
        );
        for (table, count) in &result.rows_written {
            info!("  {}: {}", table.name(), count);
        }
    }
    info!("Total: {} rows written", total_written);
    if total_failed > 0 {
        warn!("{} source rows failed and were skipped", total_failed);
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    if matches!(cli_args.command, Command::ListStages) {
        for def in STAGES {
            if def.prerequisites.is_empty() {
                println!("{}", def.name);
            } else {
                println!("{} (requires: {})", def.name, def.prerequisites.join(", "));
            }
        }
        return Ok(());
    }

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  data_dir: {:?}", app_config.data_dir);
    info!("  warehouse_db: {:?}", app_config.warehouse_db);
    info!("  chunk_size: {}", app_config.chunk_size);

    if !app_config.warehouse_db.exists() {
        info!(
            "Creating new warehouse database at {:?}",
            app_config.warehouse_db
        );
    }
    let store = WarehouseStore::open(&app_config.warehouse_db)?;
    let mut pipeline = Pipeline::new(store, app_config);

    match &cli_args.command {
        Command::RunAll => {
            let results = pipeline.run_all()?;
            report(&results);
        }
        Command::RunStage { name } => {
            let result = pipeline.run_stage(name)?;
            report(&[result]);
        }
        Command::ListStages => unreachable!(),
    }
    Ok(())
}
