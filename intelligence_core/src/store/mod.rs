mod actions;
mod metrics;
mod reducer;
mod state;

use std::sync::Arc;

use tokio::sync::watch;

pub use actions::Action;
pub use metrics::DerivedMetrics;
pub use reducer::reduce;
pub use state::IntelligenceState;

/// Owned handle to the entity store.
///
/// Clones share the same state. `dispatch` is the only mutation path and each
/// call is applied atomically against the latest snapshot, so concurrent
/// dispatchers resolve last-write-wins in dispatch order.
#[derive(Clone)]
pub struct IntelligenceStore {
    tx: Arc<watch::Sender<Arc<IntelligenceState>>>,
}

impl Default for IntelligenceStore {
    fn default() -> Self {
        Self::new(IntelligenceState::new())
    }
}

impl IntelligenceStore {
    pub fn new(initial: IntelligenceState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(action = action.name()))]
    pub fn dispatch(&self, action: Action) {
        self.tx.send_modify(|state| {
            *state = Arc::new(reduce(state, &action));
        });
    }

    /// Current snapshot. Cheap: shares the underlying state.
    pub fn snapshot(&self) -> Arc<IntelligenceState> {
        self.tx.borrow().clone()
    }

    /// Change feed; every dispatch marks the receiver as changed.
    pub fn subscribe(&self) -> watch::Receiver<Arc<IntelligenceState>> {
        self.tx.subscribe()
    }
}
