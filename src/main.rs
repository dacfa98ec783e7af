use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use clipkeep::system::feedback::TerminalBell;
use clipkeep::{logging, ArboardClipboard, ClipboardEngine, ClipboardMonitor, EngineSettings, HistoryEvent};

/// Watch the system clipboard and keep a history of what was copied
#[derive(Parser, Debug)]
#[command(name = "clipkeep", version, about)]
struct Cli {
    /// Settings file to use instead of the per-user default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Maximum number of history entries
    #[arg(long)]
    capacity: Option<usize>,

    /// Ring the terminal bell when an entry is copied back
    #[arg(long)]
    bell: bool,
}

async fn load_settings(cli: &Cli) -> EngineSettings {
    let loaded = match &cli.config {
        Some(path) => EngineSettings::load_from(path).await,
        None => EngineSettings::load().await,
    };
    let mut settings = loaded.unwrap_or_else(|e| {
        warn!("failed to load settings, using defaults: {}", e);
        EngineSettings::default()
    });

    if let Some(poll_ms) = cli.poll_ms {
        settings.poll_interval_ms = poll_ms;
    }
    if let Some(capacity) = cli.capacity {
        settings.capacity = capacity;
    }
    settings.validated()
}

fn log_event(event: &HistoryEvent) {
    match event {
        HistoryEvent::Inserted(entry) => {
            info!(kind = %entry.kind(), preview = %entry.preview, "new clipboard entry")
        }
        HistoryEvent::Merged(entry) => {
            info!(preview = %entry.preview, copies = entry.copy_count, "copied again")
        }
        HistoryEvent::Evicted(ids) => info!(count = ids.len(), "evicted old entries"),
        other => match serde_json::to_string(other) {
            Ok(json) => info!("{}", json),
            Err(_) => info!("{:?}", other),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let settings = load_settings(&cli).await;

    if !ArboardClipboard::available() {
        warn!("system clipboard is not available yet; reads will be retried on every poll");
    }

    let clipboard = ArboardClipboard::new().context("failed to start clipboard owner thread")?;
    let mut engine = ClipboardEngine::new(&settings, clipboard);
    if cli.bell {
        engine = engine.with_feedback(TerminalBell);
    }

    let (monitor, handle) = ClipboardMonitor::spawn(engine, settings.poll_interval());
    let mut events = monitor.subscribe();
    monitor.start().await.context("failed to start clipboard monitor")?;
    info!(
        poll_ms = settings.poll_interval_ms,
        capacity = settings.capacity,
        "watching clipboard, press Ctrl+C to stop"
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl+C")?;
                break;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop().await?;
    monitor.shutdown().await?;
    handle.await.context("clipboard monitor task panicked")?;
    Ok(())
}
