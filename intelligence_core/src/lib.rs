//! Client-side state core for the ML intelligence dashboard: entity store,
//! command façade and real-time sync.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod facade;
pub mod memory;
pub mod models;
pub mod notify;
pub mod o11y;
pub mod store;
pub mod sync;

pub use api::IntelligenceApi;
pub use config::IntelligenceConfig;
pub use error::{ApiErrorKind, Error, Result};
pub use events::{OutboundMessage, PushEvent};
pub use facade::{InitReport, IntelligenceService, LoadFailure};
pub use memory::MemoryIntelligenceApi;
pub use notify::{BroadcastNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use store::{Action, DerivedMetrics, IntelligenceState, IntelligenceStore};
pub use sync::{PushConnection, PushTransport, SyncHandle};
