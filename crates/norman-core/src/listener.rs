// ── Notification listener ──
//
// Runs notification sessions back to back for as long as the hub is
// connected. Every notification triggers a refresh on the same session.
// A scheduled lifetime expiry reconnects at once; anything else sleeps
// the reconnect interval and refreshes before trying again.

use std::ops::ControlFlow;
use std::sync::Arc;

use norman_api::{SessionEnd, SessionEvent};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ListenerConfig;
use crate::coordinator::DataCoordinator;
use crate::hub_api::{HubApi, NotificationSource};

// ── ConnectionState ──────────────────────────────────────────────────

/// Listener state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// Not started yet.
    Idle,
    /// A notification session is open or being opened.
    Streaming,
    /// A session hit its lifetime bound; the next one opens immediately.
    PeriodicReconnectPending,
    /// Waiting out the reconnect interval after a failure.
    Backoff,
    /// Cancelled. Terminal.
    Stopped,
}

// ── ReconnectLoop ────────────────────────────────────────────────────

/// Outer retry loop around notification sessions.
pub struct ReconnectLoop<H: HubApi> {
    coordinator: Arc<DataCoordinator<H>>,
    config: ListenerConfig,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl<H: HubApi> ReconnectLoop<H> {
    pub fn new(coordinator: Arc<DataCoordinator<H>>, config: ListenerConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self::with_state(coordinator, config, Arc::new(state))
    }

    /// Publish state transitions into an existing channel.
    pub fn with_state(
        coordinator: Arc<DataCoordinator<H>>,
        config: ListenerConfig,
        state: Arc<watch::Sender<ConnectionState>>,
    ) -> Self {
        Self {
            coordinator,
            config,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Run until `cancel` fires. Never returns otherwise.
    pub async fn run(self, cancel: CancellationToken) {
        info!("notification listener started");

        while !cancel.is_cancelled() {
            self.set_state(ConnectionState::Streaming);

            let end = match self
                .coordinator
                .api()
                .open_session(self.config.session.clone(), cancel.clone())
            {
                Ok(mut session) => match self.stream(&mut session, &cancel).await {
                    ControlFlow::Continue(end) => end,
                    ControlFlow::Break(()) => break,
                },
                Err(e) => SessionEnd::ConnectionFailed(e),
            };

            match end {
                SessionEnd::Cancelled => break,
                SessionEnd::PeriodicReconnect => {
                    debug!("notification session reached its lifetime, reconnecting");
                    self.set_state(ConnectionState::PeriodicReconnectPending);
                }
                SessionEnd::Closed => {
                    info!(
                        delay_secs = self.config.reconnect_interval.as_secs(),
                        "notification stream closed by hub, reconnecting after delay"
                    );
                    if self.backoff(&cancel).await.is_break() {
                        break;
                    }
                }
                SessionEnd::ConnectionFailed(e) => {
                    warn!(
                        error = %e,
                        delay_secs = self.config.reconnect_interval.as_secs(),
                        "notification listener disconnected, reconnecting after delay"
                    );
                    if self.backoff(&cancel).await.is_break() {
                        break;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Stopped);
        info!("notification listener stopped");
    }

    /// Drain one session, refreshing on every notification.
    async fn stream<S: NotificationSource>(
        &self,
        session: &mut S,
        cancel: &CancellationToken,
    ) -> ControlFlow<(), SessionEnd> {
        loop {
            match session.next_event().await {
                SessionEvent::Notification(notification) => {
                    debug!(
                        peripherals = ?notification.peripheral_ids(),
                        "received notification"
                    );
                    if self.refresh(cancel).await.is_break() {
                        return ControlFlow::Break(());
                    }
                }
                SessionEvent::End(end) => return ControlFlow::Continue(end),
            }
        }
    }

    /// Sleep the reconnect interval, then refresh to catch up on changes
    /// missed while disconnected.
    async fn backoff(&self, cancel: &CancellationToken) -> ControlFlow<()> {
        self.set_state(ConnectionState::Backoff);

        tokio::select! {
            biased;
            () = cancel.cancelled() => return ControlFlow::Break(()),
            () = tokio::time::sleep(self.config.reconnect_interval) => {}
        }

        debug!("refreshing device state after reconnect delay");
        self.refresh(cancel).await
    }

    async fn refresh(&self, cancel: &CancellationToken) -> ControlFlow<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => ControlFlow::Break(()),
            // Failures are logged by the coordinator.
            _ = self.coordinator.refresh() => ControlFlow::Continue(()),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}
