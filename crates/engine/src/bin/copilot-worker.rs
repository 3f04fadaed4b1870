//! copilot-worker — runs the proactive notification engine for one company.
//!
//! Reads ERP snapshots from `--erp-dir` and keeps local bookkeeping state and
//! the persisted notification set under `--data-dir`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use copilot_core::config::{load_dotenv, CopilotConfig};
use copilot_engine::{
    Copilot, FileKvStore, JsonFileErp, KvLocalData, KvStore, Scheduler, SystemClock,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Copilot worker — periodic bookkeeping checks and notification inbox.
#[derive(Parser, Debug)]
#[command(name = "copilot-worker", version, about)]
struct Cli {
    /// Directory holding local state and the persisted notifications
    /// (overrides COPILOT_DATA_DIR).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory holding ERP snapshot files.
    #[arg(long, global = true, env = "COPILOT_ERP_DIR", default_value = "erp")]
    erp_dir: PathBuf,

    /// Company whose notifications to manage (overrides COPILOT_COMPANY_ID).
    #[arg(long, global = true)]
    company: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler until Ctrl-C.
    Run,
    /// Force one check cycle and print the resulting list.
    Check,
    /// Print the persisted list.
    List,
    /// Mark one notification read.
    MarkRead { id: String },
    /// Mark every notification read.
    MarkAllRead,
    /// Remove one notification.
    Dismiss { id: String },
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = CopilotConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(company) = cli.company {
        config.company_id = company;
    }
    config.log_summary();

    let kv: Arc<dyn KvStore> = Arc::new(
        FileKvStore::open(&config.storage.data_dir)
            .with_context(|| format!("opening data dir {}", config.storage.data_dir.display()))?,
    );
    let engine = Arc::new(
        Copilot::new(
            config.clone(),
            Arc::new(JsonFileErp::new(&cli.erp_dir)),
            Arc::new(KvLocalData::new(kv.clone())),
            kv,
            Arc::new(SystemClock),
        )
        .context("loading persisted notifications")?,
    );

    match cli.command {
        Command::Run => run(engine, &config).await?,
        Command::Check => {
            if engine.force_check().await.is_none() {
                warn!("check cycle did not persist, showing previous list");
            }
            print_list(&engine).await?;
        }
        Command::List => print_list(&engine).await?,
        Command::MarkRead { id } => {
            let changed = engine.mark_read(&id).await.context("mark_read")?;
            info!(id = %id, changed, "mark-read done");
        }
        Command::MarkAllRead => {
            let changed = engine.mark_all_read().await.context("mark_all_read")?;
            info!(changed, "mark-all-read done");
        }
        Command::Dismiss { id } => {
            let removed = engine.dismiss(&id).await.context("dismiss")?;
            info!(id = %id, removed, "dismiss done");
        }
    }

    Ok(())
}

async fn run(engine: Arc<Copilot>, config: &CopilotConfig) -> anyhow::Result<()> {
    let mut updates = engine.subscribe();
    let scheduler =
        Scheduler::new(engine, &config.scheduler).context("invalid scheduler config")?;
    scheduler.start();
    info!("copilot-worker running, Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                break;
            }
            update = updates.recv() => match update {
                Ok(update) => info!(
                    total = update.notifications.len(),
                    unread = update.unread_count,
                    "notifications updated"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "update listener lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.stop();
    info!("copilot-worker exited cleanly");
    Ok(())
}

async fn print_list(engine: &Copilot) -> anyhow::Result<()> {
    let list = engine.list().await;
    let json = serde_json::to_string_pretty(&list).context("serializing notifications")?;
    println!("{json}");
    Ok(())
}
