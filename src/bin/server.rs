use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use dbsvr::catalog::SchemaRegistry;
use dbsvr::config::ServiceConfig;
use dbsvr::mapper::Mapper;
use dbsvr::proto::DbUserRecord;
use dbsvr::store;
use dbsvr::transport::{RpcClient, SessionSlot};
use dbsvr::worker::{Worker, WorkerContext};

#[derive(Debug, Parser)]
#[command(name = "dbsvr-server", version, about = "Single-writer database service")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Validate the config and exit
    #[arg(long)]
    check_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(level) = args.log_level {
        config = config.log_level(level);
    }
    if args.check_config {
        config.validate()?;
        println!("config ok");
        return Ok(());
    }

    dbsvr::logging::init(&config.logging.level)?;
    info!(rpc = %config.rpc.addr, backend = ?config.store.backend, "starting dbsvr");

    // The postgres client runs its own runtime, so the store and worker are
    // built on this thread before the transport runtime exists
    let mut store = store::open(&config.store).context("opening store")?;
    let registry = Arc::new(SchemaRegistry::new(config.mapper.table_naming));
    let mapper = Mapper::new(registry, config.dialect());
    if config.store.auto_create_tables {
        mapper
            .ensure_table::<DbUserRecord>(&mut *store)
            .context("creating tables")?;
    }

    let session = SessionSlot::new();
    let worker = Worker::new(
        config.worker.queue_capacity,
        WorkerContext::new(mapper, store, session.clone()),
    )?;
    worker.start()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dbsvr-rpc")
        .build()
        .context("building runtime")?;

    let client = RpcClient::new(config.rpc.clone(), worker.handle(), session);
    let result = runtime.block_on(async move {
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
            }
            let _ = stop_tx.send(true);
        });
        client.run(stop_rx).await
    });
    runtime.shutdown_background();

    if let Err(err) = &result {
        error!(error = %err, "rpc client failed");
    }
    worker.stop()?;
    info!("dbsvr stopped");
    Ok(result?)
}
