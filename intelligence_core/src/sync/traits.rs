use async_trait::async_trait;

use crate::Result;

/// Opens real-time connections scoped to a room (team or hub id).
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self, room: &str) -> Result<Box<dyn PushConnection>>;
}

/// One live real-time connection.
#[async_trait]
pub trait PushConnection: Send {
    /// Next inbound text frame. `None` means the peer closed the connection.
    async fn recv(&mut self) -> Option<Result<String>>;

    async fn send(&mut self, text: String) -> Result<()>;

    /// Orderly close. Errors are not interesting to callers.
    async fn close(&mut self);
}
