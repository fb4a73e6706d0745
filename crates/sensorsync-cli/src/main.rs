//! sensorsync binary.
//!
//! Reads `sensorsync.toml` (or the path given with `--config`) plus
//! `SENSORSYNC__*` environment overrides, opens the SQLite store, and either
//! runs the periodic YoLink sync or performs a one-off maintenance command.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use sensorsync_core::{
  DeviceFilter, EventFilter, JobCategory, JobFilter, LogFilter, Timestamp,
  sensor::SensorConnection,
  store::{DataStore, Store, TimestampedStore},
};
use sensorsync_ingest::{JobHandle, Scheduler, run_sync};
use sensorsync_store_sqlite::SqliteDatabase;
use sensorsync_yolink::{YoLinkConfig, YoLinkConnection};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser)]
#[command(author, version, about = "Sensor telemetry sync")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sensorsync.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Sync once, then on every interval until Ctrl-C; export events on exit.
  Run,
  /// Create missing tables.
  Setup {
    /// Drop and recreate every table.
    #[arg(long)]
    destructive: bool,
  },
  /// Write one table to a CSV file in the export directory.
  Export {
    table: TableName,
    /// Only rows recorded after this epoch second.
    #[arg(long)]
    since: Option<i64>,
    /// Only rows recorded before this epoch second.
    #[arg(long)]
    until: Option<i64>,
  },
  /// Probe the database and the vendor connection.
  Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum TableName {
  Devices,
  Events,
  Jobs,
  Logs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)
    .with_context(|| format!("failed to read configuration from {}", cli.config.display()))?;

  match cli.command {
    Command::Run => run(&settings).await,
    Command::Setup { destructive } => setup(&settings, destructive).await,
    Command::Export { table, since, until } => {
      let db = open(&settings, false).await?;
      let path = export(&db, table, since.map(Timestamp::from_secs), until.map(Timestamp::from_secs))
        .await?;
      println!("{}", path.display());
      Ok(())
    }
    Command::Status => status(&settings).await,
  }
}

async fn open(settings: &Settings, destructive: bool) -> anyhow::Result<SqliteDatabase> {
  SqliteDatabase::open(&settings.database_path, settings.store_options(destructive))
    .await
    .with_context(|| format!("failed to open database at {}", settings.database_path.display()))
}

fn yolink_config(settings: &Settings) -> anyhow::Result<YoLinkConfig> {
  if !settings.has_credentials() {
    bail!("yolink.client_id and yolink.client_secret must be set");
  }
  Ok(settings.yolink_config())
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn run(settings: &Settings) -> anyhow::Result<()> {
  let db = open(settings, settings.destructive_setup).await?;
  let sensor = Arc::new(
    YoLinkConnection::connect(yolink_config(settings)?)
      .await
      .context("failed to connect to YoLink")?,
  );
  let options = settings.sync_options();

  let main_job = JobHandle::start(&db, JobCategory::Main, None)
    .await
    .context("failed to record main job")?;
  main_job.info("sensorsync started").await;

  let report = run_sync(&db, sensor.as_ref(), Some(main_job.id()), &options)
    .await
    .context("initial sync failed")?;
  tracing::info!(?report, "initial sync finished");

  let scheduler = {
    let db = db.clone();
    let sensor = sensor.clone();
    let parent = main_job.id().clone();
    Scheduler::start(settings.sync_interval(), move || {
      let db = db.clone();
      let sensor = sensor.clone();
      let parent = parent.clone();
      let options = options.clone();
      async move {
        match run_sync(&db, sensor.as_ref(), Some(&parent), &options).await {
          Ok(report) => tracing::info!(?report, "scheduled sync finished"),
          Err(error) => tracing::error!(%error, "scheduled sync failed"),
        }
      }
    })
    .context("failed to start scheduler")?
  };

  tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
  tracing::info!("shutting down");
  scheduler.stop().await.context("scheduler did not stop cleanly")?;

  let export_job = main_job.child(JobCategory::Export).await?;
  match export(&db, TableName::Events, None, None).await {
    Ok(path) => export_job.info(format!("exported events to {}", path.display())).await,
    Err(error) => export_job.error(format!("event export failed: {error:#}")).await,
  }
  export_job.finish().await?;

  main_job.info("sensorsync stopped").await;
  main_job.finish().await?;
  Ok(())
}

async fn setup(settings: &Settings, destructive: bool) -> anyhow::Result<()> {
  let db = open(settings, false).await?;
  if destructive {
    db.setup(true).await.context("destructive setup failed")?;
  }
  tracing::info!(destructive, "tables ready");
  Ok(())
}

async fn export(
  db: &SqliteDatabase,
  table: TableName,
  since: Option<Timestamp>,
  until: Option<Timestamp>,
) -> anyhow::Result<PathBuf> {
  let path = match table {
    TableName::Devices => {
      if since.is_some() || until.is_some() {
        bail!("devices have no recording time to filter on");
      }
      let devices = db.devices();
      devices.export(devices.get(DeviceFilter::default())).await
    }
    TableName::Events => {
      let events = db.events();
      events
        .export(events.get_in_time_range(EventFilter::default(), since, until))
        .await
    }
    TableName::Jobs => {
      let jobs = db.jobs();
      jobs
        .export(jobs.get_in_time_range(JobFilter::default(), since, until))
        .await
    }
    TableName::Logs => {
      let logs = db.logs();
      logs
        .export(logs.get_in_time_range(LogFilter::default(), since, until))
        .await
    }
  };
  path.context("export failed")
}

async fn status(settings: &Settings) -> anyhow::Result<()> {
  let db = open(settings, false).await?;
  println!("database: {}", db.status().await);

  let config = match yolink_config(settings) {
    Ok(config) => config,
    Err(error) => {
      println!("yolink: not configured ({error})");
      return Ok(());
    }
  };
  let sensor = YoLinkConnection::new(config).context("failed to build YoLink client")?;
  println!("{}: {}", sensor.brand(), sensor.status().await);
  Ok(())
}
