#![forbid(unsafe_code)]

mod apis;
mod client;
mod error;
mod types;
mod ws;

pub use apis::*;
pub use client::{ClientOptions, IntelligenceClient};
pub use error::ClientError;
pub use types::Health;
pub use ws::WsTransport;
