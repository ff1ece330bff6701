//! Connection lifecycle of the real-time channel as a pure state machine.
//!
//! The machine never performs I/O. It consumes `SyncInput`s and returns the
//! `SyncEffect`s the driver must execute, which keeps every transition
//! replayable in tests.

use std::time::Duration;

use crate::events::PushEvent;
use crate::notify::Notification;
use crate::store::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncInput {
    Start,
    Opened,
    Closed { reason: String },
    ReconnectDue,
    Message(String),
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEffect {
    Connect,
    SendJoin,
    ScheduleReconnect(Duration),
    Dispatch(Action),
    Notify(Notification),
    Disconnect,
}

#[derive(Debug, Clone)]
pub struct SyncMachine {
    state: ChannelState,
    reconnect_delay: Duration,
    reconnect_pending: bool,
    stopped: bool,
}

impl SyncMachine {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ChannelState::Disconnected,
            reconnect_delay,
            reconnect_pending: false,
            stopped: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn handle(&mut self, input: SyncInput) -> Vec<SyncEffect> {
        if self.stopped {
            return vec![];
        }
        match input {
            SyncInput::Start => {
                if self.state != ChannelState::Disconnected || self.reconnect_pending {
                    return vec![];
                }
                self.state = ChannelState::Connecting;
                vec![SyncEffect::Connect]
            }
            SyncInput::Opened => {
                if self.state != ChannelState::Connecting {
                    return vec![];
                }
                self.state = ChannelState::Connected;
                vec![
                    SyncEffect::SendJoin,
                    SyncEffect::Dispatch(Action::SetConnected(true)),
                    SyncEffect::Notify(Notification::success(
                        "Connected",
                        "Real-time updates enabled",
                    )),
                ]
            }
            SyncInput::Closed { reason } => {
                let was = self.state;
                self.state = ChannelState::Disconnected;

                let mut effects = Vec::new();
                if was == ChannelState::Connected {
                    tracing::warn!(%reason, "real-time channel closed");
                    effects.push(SyncEffect::Dispatch(Action::SetConnected(false)));
                    effects.push(SyncEffect::Notify(Notification::warning(
                        "Disconnected",
                        format!(
                            "Real-time updates paused, reconnecting in {}s",
                            self.reconnect_delay.as_secs()
                        ),
                    )));
                } else {
                    tracing::debug!(%reason, ?was, "real-time channel unavailable");
                }
                // At most one pending reconnect, however many closes arrive.
                if !self.reconnect_pending {
                    self.reconnect_pending = true;
                    effects.push(SyncEffect::ScheduleReconnect(self.reconnect_delay));
                }
                effects
            }
            SyncInput::ReconnectDue => {
                self.reconnect_pending = false;
                if self.state != ChannelState::Disconnected {
                    return vec![];
                }
                self.state = ChannelState::Connecting;
                vec![SyncEffect::Connect]
            }
            SyncInput::Message(text) => {
                if self.state != ChannelState::Connected {
                    return vec![];
                }
                match PushEvent::parse(&text) {
                    Some(event) => {
                        tracing::debug!(kind = event.kind(), "push event");
                        vec![SyncEffect::Dispatch(event.into_action())]
                    }
                    None => vec![],
                }
            }
            SyncInput::Stop => {
                self.stopped = true;
                self.reconnect_pending = false;
                let was = std::mem::replace(&mut self.state, ChannelState::Disconnected);
                match was {
                    ChannelState::Connected => vec![
                        SyncEffect::Disconnect,
                        SyncEffect::Dispatch(Action::SetConnected(false)),
                    ],
                    ChannelState::Connecting => vec![SyncEffect::Disconnect],
                    ChannelState::Disconnected => vec![],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationLevel;

    const DELAY: Duration = Duration::from_secs(5);

    fn connected() -> SyncMachine {
        let mut m = SyncMachine::new(DELAY);
        assert_eq!(m.handle(SyncInput::Start), vec![SyncEffect::Connect]);
        assert_eq!(m.state(), ChannelState::Connecting);
        let effects = m.handle(SyncInput::Opened);
        assert_eq!(effects[0], SyncEffect::SendJoin);
        assert_eq!(
            effects[1],
            SyncEffect::Dispatch(Action::SetConnected(true))
        );
        assert_eq!(m.state(), ChannelState::Connected);
        m
    }

    fn closed(reason: &str) -> SyncInput {
        SyncInput::Closed {
            reason: reason.to_string(),
        }
    }

    fn schedules(effects: &[SyncEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, SyncEffect::ScheduleReconnect(_)))
            .count()
    }

    #[test]
    fn repeated_closes_schedule_exactly_one_reconnect() {
        let mut m = connected();
        let mut total = 0;
        for i in 0..10 {
            total += schedules(&m.handle(closed(&format!("drop {i}"))));
        }
        assert_eq!(total, 1);
        assert!(m.reconnect_pending());
        assert_eq!(m.state(), ChannelState::Disconnected);
    }

    #[test]
    fn close_from_connected_clears_flag_and_warns() {
        let mut m = connected();
        let effects = m.handle(closed("eof"));
        assert!(effects.contains(&SyncEffect::Dispatch(Action::SetConnected(false))));
        assert!(effects.iter().any(|e| matches!(
            e,
            SyncEffect::Notify(n) if n.level == NotificationLevel::Warning
        )));
        assert!(effects.contains(&SyncEffect::ScheduleReconnect(DELAY)));
    }

    #[test]
    fn failed_connect_retries_without_notifying() {
        let mut m = SyncMachine::new(DELAY);
        m.handle(SyncInput::Start);
        let effects = m.handle(closed("refused"));
        assert_eq!(effects, vec![SyncEffect::ScheduleReconnect(DELAY)]);
        assert_eq!(m.handle(SyncInput::ReconnectDue), vec![SyncEffect::Connect]);
        assert!(!m.reconnect_pending());
        assert_eq!(m.state(), ChannelState::Connecting);
    }

    #[test]
    fn loops_through_the_full_cycle() {
        let mut m = connected();
        m.handle(closed("eof"));
        m.handle(SyncInput::ReconnectDue);
        m.handle(SyncInput::Opened);
        assert_eq!(m.state(), ChannelState::Connected);
        assert_eq!(schedules(&m.handle(closed("eof"))), 1);
    }

    #[test]
    fn messages_dispatch_only_known_events_while_connected() {
        let mut m = SyncMachine::new(DELAY);
        let frame = r#"{"type":"system_metrics","payload":{"cpuUsage":0.5}}"#.to_string();
        assert!(m.handle(SyncInput::Message(frame.clone())).is_empty());

        let mut m = connected();
        let effects = m.handle(SyncInput::Message(frame));
        assert!(matches!(
            effects.as_slice(),
            [SyncEffect::Dispatch(Action::SetSystemMetrics(_))]
        ));
        assert!(m
            .handle(SyncInput::Message(r#"{"type":"mystery"}"#.to_string()))
            .is_empty());
        assert!(m.handle(SyncInput::Message("{{{".to_string())).is_empty());
    }

    #[test]
    fn stop_is_final() {
        let mut m = connected();
        let effects = m.handle(SyncInput::Stop);
        assert_eq!(effects[0], SyncEffect::Disconnect);
        assert!(m.is_stopped());
        assert!(m.handle(closed("late")).is_empty());
        assert!(m.handle(SyncInput::ReconnectDue).is_empty());
        assert!(m.handle(SyncInput::Start).is_empty());
    }

    #[test]
    fn stale_open_is_ignored() {
        let mut m = SyncMachine::new(DELAY);
        assert!(m.handle(SyncInput::Opened).is_empty());
        assert_eq!(m.state(), ChannelState::Disconnected);
    }
}
