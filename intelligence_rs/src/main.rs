use std::sync::Arc;

use clap::{Parser, Subcommand};
use intelligence_core::{
    IntelligenceConfig, IntelligenceService, IntelligenceStore, Notifier, SyncHandle,
    TracingNotifier,
};
use intelligence_rs::{IntelligenceClient, WsTransport};

#[derive(Debug, Parser)]
#[command(name = "intelligence", version, about = "ML intelligence dashboard client")]
struct Cli {
    /// REST API base URL.
    #[arg(long, global = true, env = "INTELLIGENCE_API_URL")]
    api_url: Option<String>,

    /// Real-time socket URL.
    #[arg(long, global = true, env = "INTELLIGENCE_WS_URL")]
    ws_url: Option<String>,

    /// Room (team or hub id) joined on the real-time channel.
    #[arg(long, global = true, env = "INTELLIGENCE_ROOM")]
    room: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load everything, then follow live updates until Ctrl-C.
    Watch,

    /// Load everything once and print the store as JSON.
    Snapshot,

    /// Check the backend health endpoint.
    Health,
}

impl Cli {
    fn config(&self) -> anyhow::Result<IntelligenceConfig> {
        let mut cfg = IntelligenceConfig::from_env()?;
        if let Some(v) = &self.api_url {
            cfg.api_base_url = v.clone();
        }
        if let Some(v) = &self.ws_url {
            cfg.socket_url = v.clone();
        }
        if let Some(v) = &self.room {
            cfg.room = v.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    intelligence_core::o11y::init_global_from_env()?;
    let cli = Cli::parse();
    let cfg = cli.config()?;
    let client = Arc::new(IntelligenceClient::from_config(&cfg)?);

    match cli.cmd {
        Command::Watch => watch(cfg, client).await?,
        Command::Snapshot => {
            let store = IntelligenceStore::default();
            let service =
                IntelligenceService::new(client, store.clone(), Arc::new(TracingNotifier));
            let report = service.initialize().await;
            if !report.is_complete() {
                tracing::warn!(failures = report.failures.len(), "snapshot is partial");
            }
            println!("{}", serde_json::to_string_pretty(&*store.snapshot())?);
        }
        Command::Health => {
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
    }

    Ok(())
}

#[tracing::instrument(level = "info", skip_all, fields(room = %cfg.room))]
async fn watch(cfg: IntelligenceConfig, client: Arc<IntelligenceClient>) -> anyhow::Result<()> {
    let store = IntelligenceStore::default();
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let service = IntelligenceService::new(client.clone(), store.clone(), notifier.clone());
    service.initialize().await;

    let mut transport = WsTransport::new(cfg.socket_url.clone());
    if let Some(key) = cfg.api_key.as_deref() {
        transport = transport.with_api_key(key);
    }
    let handle = SyncHandle::start(&cfg, Arc::new(transport), client, store.clone(), notifier);

    let mut rx = store.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                tracing::info!("shutting down");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                let m = &state.metrics;
                tracing::info!(
                    connected = state.connected,
                    models = m.total_models,
                    active_training = m.active_training_jobs,
                    active_inferences = m.active_inferences,
                    deployments = m.active_deployments,
                    replicas = m.total_replicas,
                    insights = m.active_insights,
                    avg_latency_ms = m.average_inference_latency_ms,
                    "state updated"
                );
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
