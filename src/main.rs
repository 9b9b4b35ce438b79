//! bucketeer - object-storage transfer CLI

use bucketeer::cli::{Cli, Request};
use bucketeer::client::Transfers;
use bucketeer::config::Config;
use bucketeer::resume::ResumeManager;
use bucketeer::storage::S3Store;
use clap::Parser;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Guard keeps the log file writer alive until exit
    let _guard = init_tracing(cli.verbose, cli.json);

    if cli.init_config {
        let path = match &cli.config {
            Some(p) => p.clone(),
            None => Config::default_config_path()?,
        };
        Config::example().save_to(&path)?;
        println!("Wrote starter configuration to {}", path.display());
        return Ok(());
    }

    let request = cli.to_request()?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let target = config.resolve(cli.target_name()?)?;

    let store = S3Store::connect(target, cli.internal).await?;
    let transfers = Transfers::new(store, ResumeManager::new()?, !cli.no_progress);

    match request {
        Request::Upload {
            path,
            key,
            resumable,
        } => {
            transfers.upload(&path, key.as_deref(), resumable).await?;
        }
        Request::Download { key, path } => {
            transfers.download(&key, path.as_deref()).await?;
        }
    }

    Ok(())
}

/// Initialize tracing with a console layer and a rotating daily log file
fn init_tracing(verbose: u8, json: bool) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("bucketeer=info"),
        1 => EnvFilter::new("bucketeer=debug"),
        2 => EnvFilter::new("bucketeer=trace"),
        _ => EnvFilter::new("trace"),
    };

    let (file_layer, guard) = match log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "bucketeer.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let base = tracing_subscriber::registry().with(filter).with(file_layer);
    if json {
        base.with(fmt::layer().json()).init();
    } else {
        base.with(fmt::layer().pretty()).init();
    }

    guard
}

/// Directory for rotating log files, created on demand
fn log_dir() -> Option<PathBuf> {
    let dir = dirs::data_local_dir()?.join("bucketeer").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
