use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

use super::machine::{SyncEffect, SyncInput, SyncMachine};
use super::traits::{PushConnection, PushTransport};
use crate::events::OutboundMessage;
use crate::notify::Notifier;
use crate::store::IntelligenceStore;
use crate::Result;

type Connection = Option<Box<dyn PushConnection>>;
type ReconnectTimer = Option<Pin<Box<Sleep>>>;

/// Drives a `SyncMachine` against a real transport.
///
/// Holds at most one live connection and at most one reconnect timer.
pub struct SyncChannel {
    transport: Arc<dyn PushTransport>,
    store: IntelligenceStore,
    notifier: Arc<dyn Notifier>,
    room: String,
    machine: SyncMachine,
}

impl SyncChannel {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        store: IntelligenceStore,
        notifier: Arc<dyn Notifier>,
        room: impl Into<String>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            notifier,
            room: room.into(),
            machine: SyncMachine::new(reconnect_delay),
        }
    }

    /// Run until `cancel` fires. The connection is closed on the way out.
    #[tracing::instrument(level = "info", skip_all, fields(room = %self.room))]
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut conn: Connection = None;
        let mut reconnect: ReconnectTimer = None;
        let mut pending: VecDeque<SyncEffect> = self.machine.handle(SyncInput::Start).into();

        loop {
            while let Some(effect) = pending.pop_front() {
                let follow_up = self
                    .execute(effect, &mut conn, &mut reconnect, &cancel)
                    .await;
                pending.extend(follow_up);
            }

            let input = tokio::select! {
                _ = cancel.cancelled() => SyncInput::Stop,
                _ = wait_reconnect(&mut reconnect) => {
                    reconnect = None;
                    SyncInput::ReconnectDue
                }
                frame = recv_frame(&mut conn) => match frame {
                    Some(Ok(text)) => SyncInput::Message(text),
                    Some(Err(err)) => {
                        conn = None;
                        SyncInput::Closed { reason: err.to_string() }
                    }
                    None => {
                        conn = None;
                        SyncInput::Closed { reason: "closed by peer".to_string() }
                    }
                },
            };

            let stopping = input == SyncInput::Stop;
            pending.extend(self.machine.handle(input));
            if stopping {
                while let Some(effect) = pending.pop_front() {
                    self.execute(effect, &mut conn, &mut reconnect, &cancel)
                        .await;
                }
                break;
            }
        }

        if let Some(mut c) = conn.take() {
            c.close().await;
        }
        tracing::info!("real-time channel stopped");
    }

    async fn execute(
        &mut self,
        effect: SyncEffect,
        conn: &mut Connection,
        reconnect: &mut ReconnectTimer,
        cancel: &CancellationToken,
    ) -> Vec<SyncEffect> {
        match effect {
            SyncEffect::Connect => {
                let res = tokio::select! {
                    _ = cancel.cancelled() => return vec![],
                    res = self.transport.connect(&self.room) => res,
                };
                match res {
                    Ok(c) => {
                        *conn = Some(c);
                        self.machine.handle(SyncInput::Opened)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "real-time connect failed");
                        self.machine.handle(SyncInput::Closed {
                            reason: err.to_string(),
                        })
                    }
                }
            }
            SyncEffect::SendJoin => {
                let join = OutboundMessage::Join {
                    room: self.room.clone(),
                };
                if let Err(err) = send(conn, &join).await {
                    tracing::warn!(error = %err, "failed sending join");
                }
                vec![]
            }
            SyncEffect::ScheduleReconnect(delay) => {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
                *reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                vec![]
            }
            SyncEffect::Dispatch(action) => {
                self.store.dispatch(action);
                vec![]
            }
            SyncEffect::Notify(notification) => {
                self.notifier.notify(notification);
                vec![]
            }
            SyncEffect::Disconnect => {
                *reconnect = None;
                let leave = OutboundMessage::Leave {
                    room: self.room.clone(),
                };
                if let Err(err) = send(conn, &leave).await {
                    tracing::debug!(error = %err, "failed sending leave");
                }
                if let Some(mut c) = conn.take() {
                    c.close().await;
                }
                vec![]
            }
        }
    }
}

async fn send(conn: &mut Connection, msg: &OutboundMessage) -> Result<()> {
    match conn.as_mut() {
        Some(c) => c.send(msg.to_text()?).await,
        None => Ok(()),
    }
}

async fn recv_frame(conn: &mut Connection) -> Option<Result<String>> {
    match conn.as_mut() {
        Some(c) => c.recv().await,
        None => std::future::pending().await,
    }
}

async fn wait_reconnect(timer: &mut ReconnectTimer) {
    match timer.as_mut() {
        Some(t) => t.as_mut().await,
        None => std::future::pending().await,
    }
}
