use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::IntelligenceApi;
use crate::store::{Action, IntelligenceStore};
use crate::Result;

/// Periodically refreshes system metrics over the request/response API.
///
/// Runs regardless of the real-time channel's state.
pub struct MetricsPoller {
    api: Arc<dyn IntelligenceApi>,
    store: IntelligenceStore,
    interval: Duration,
}

impl MetricsPoller {
    pub fn new(api: Arc<dyn IntelligenceApi>, store: IntelligenceStore, interval: Duration) -> Self {
        Self {
            api,
            store,
            interval,
        }
    }

    /// Start the polling loop.
    ///
    /// The first tick fires immediately. Cancellation also abandons a poll
    /// that is still in flight, so nothing is dispatched after it.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        res = self.tick() => {
                            if let Err(e) = res {
                                tracing::warn!(%e, "metrics poll failed");
                            }
                        }
                    }
                }
            }
        }
        tracing::info!("metrics poller cancelled");
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn tick(&self) -> Result<()> {
        let metrics = self.api.system_metrics().await?;
        self.store.dispatch(Action::SetSystemMetrics(metrics));
        Ok(())
    }
}
