//! Keeps the store current with the server: a reconnecting real-time channel
//! plus a periodic metrics poll.

mod channel;
mod machine;
mod poller;
mod traits;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use channel::SyncChannel;
pub use machine::{ChannelState, SyncEffect, SyncInput, SyncMachine};
pub use poller::MetricsPoller;
pub use traits::{PushConnection, PushTransport};

use crate::api::IntelligenceApi;
use crate::config::IntelligenceConfig;
use crate::notify::Notifier;
use crate::store::IntelligenceStore;

/// Running sync tasks. Dropping the handle stops them.
pub struct SyncHandle {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Spawn the real-time channel and the metrics poller.
    #[tracing::instrument(level = "debug", skip_all, fields(room = %cfg.room))]
    pub fn start(
        cfg: &IntelligenceConfig,
        transport: Arc<dyn PushTransport>,
        api: Arc<dyn IntelligenceApi>,
        store: IntelligenceStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let channel = SyncChannel::new(
            transport,
            store.clone(),
            notifier,
            cfg.room.clone(),
            cfg.reconnect_delay(),
        );
        let poller = MetricsPoller::new(api, store, cfg.metrics_poll_interval());

        let tasks = vec![
            tokio::spawn(channel.run(cancel.clone())),
            tokio::spawn({
                let cancel = cancel.clone();
                async move { poller.run(cancel).await }
            }),
        ];
        Self { cancel, tasks }
    }

    /// Cancel both tasks and wait for them to finish. The socket is closed
    /// before this returns.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        // `SyncHandle` implements `Drop`, so avoid moving fields out directly.
        let tasks = std::mem::take(&mut self.tasks);
        for t in tasks {
            if let Err(e) = t.await {
                if !e.is_cancelled() {
                    tracing::warn!(%e, "sync task ended abnormally");
                }
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        for t in &self.tasks {
            t.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIntelligenceApi;
    use crate::notify::BroadcastNotifier;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Unreachable;

    #[async_trait]
    impl PushTransport for Unreachable {
        async fn connect(&self, _room: &str) -> Result<Box<dyn PushConnection>> {
            Err(Error::transport("unreachable"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_joins_both_tasks() {
        let store = IntelligenceStore::default();
        let handle = SyncHandle::start(
            &IntelligenceConfig::default(),
            Arc::new(Unreachable),
            Arc::new(MemoryIntelligenceApi::new()),
            store.clone(),
            Arc::new(BroadcastNotifier::default()),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Metrics arrive over the poll even though the socket never opened.
        assert!(store.snapshot().system_metrics.is_some());
        assert!(!store.snapshot().connected);
        handle.shutdown().await;
    }
}
