//! granary-etl binary.
//!
//! Reads `granary.toml` (or the path specified with `--config`), opens the
//! source and warehouse SQLite databases, and runs one warehouse load.

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::Context as _;
use clap::Parser;
use granary_pipeline::{EtlConfig, EtlPipeline, LoadMode};
use granary_store_sqlite::{SqliteSource, SqliteWarehouse};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Granary warehouse loader")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "granary.toml")]
  config: PathBuf,

  /// Re-extract every source row instead of loading past the watermark.
  #[arg(long)]
  full: bool,

  /// Print the run report as JSON on stdout.
  #[arg(long)]
  report_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(true))
    .add_source(config::Environment::with_prefix("GRANARY"))
    .build()
    .context("failed to read config file")?;

  let etl_cfg: EtlConfig = settings
    .try_deserialize()
    .context("failed to deserialise EtlConfig")?;
  etl_cfg.validate().context("invalid configuration")?;

  let source_path = expand_tilde(&etl_cfg.source_db);
  let warehouse_path = expand_tilde(&etl_cfg.warehouse_db);

  let source = SqliteSource::open(&source_path)
    .await
    .with_context(|| format!("failed to open source db at {source_path:?}"))?;
  let warehouse = SqliteWarehouse::open(&warehouse_path)
    .await
    .with_context(|| format!("failed to open warehouse at {warehouse_path:?}"))?;

  let mode = if cli.full {
    LoadMode::Full
  } else {
    LoadMode::Incremental
  };

  let pipeline = EtlPipeline::new(source, warehouse, &etl_cfg);
  let report = match pipeline.run(mode).await {
    Ok(report) => report,
    Err(err) => {
      tracing::error!(stage = %err.stage, error = %err, "run failed");
      return Ok(ExitCode::FAILURE);
    }
  };

  if cli.report_json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    for stage in &report.stages {
      tracing::info!(
        stage = %stage.stage,
        extracted = stage.extracted,
        loaded = stage.loaded,
        skipped = stage.skipped,
        "stage summary"
      );
    }
  }

  Ok(ExitCode::SUCCESS)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
