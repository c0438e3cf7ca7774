// ── Hub lifecycle handle ──
//
// Explicit owner of one hub connection: the coordinator, the listener
// task and its cancellation token. Whoever creates the handle shuts it
// down; there is no process-wide registry.

use std::sync::Arc;

use norman_api::HubClient;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{CommandResult, CoverCommand};
use crate::config::HubConfig;
use crate::coordinator::{DataCoordinator, RefreshHealth};
use crate::error::CoreError;
use crate::hub_api::HubApi;
use crate::listener::{ConnectionState, ReconnectLoop};
use crate::model::{DeviceSnapshot, PeripheralId, PeripheralRecord};
use crate::stream::SnapshotStream;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`.
pub struct Hub<H: HubApi = HubClient> {
    inner: Arc<HubInner<H>>,
}

impl<H: HubApi> Clone for Hub<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct HubInner<H: HubApi> {
    config: HubConfig,
    coordinator: Arc<DataCoordinator<H>>,
    connection_state: Arc<watch::Sender<ConnectionState>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Hub<HubClient> {
    /// Connect to the hub described by `config`.
    ///
    /// Registers with the hub to confirm it is reachable, performs the
    /// first refresh, and starts the notification listener when enabled.
    pub async fn connect(config: HubConfig) -> Result<Self, CoreError> {
        let client = HubClient::for_host(&config.host, config.port, &config.transport())?;
        debug!(url = %client.base_url(), "validating hub connection");
        client.validate().await?;

        let hub = Self::new(Arc::new(client), config);
        hub.start().await?;
        Ok(hub)
    }

    /// Connect, run `f`, shut down. No listener is started.
    pub async fn oneshot<F, Fut, T>(config: HubConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Hub) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.notifications_enabled = false;

        let hub = Self::connect(cfg).await?;
        let result = f(hub.clone()).await;
        hub.shutdown().await;
        result
    }
}

impl<H: HubApi> Hub<H> {
    /// Wrap an API handle. Does NOT contact the hub; call
    /// [`start()`](Self::start).
    pub fn new(api: Arc<H>, config: HubConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Idle);
        Self {
            inner: Arc::new(HubInner {
                config,
                coordinator: Arc::new(DataCoordinator::new(api)),
                connection_state: Arc::new(connection_state),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn coordinator(&self) -> &Arc<DataCoordinator<H>> {
        &self.inner.coordinator
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// First refresh, then spawn the notification listener.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::HubDisconnected);
        }

        self.inner.coordinator.refresh().await?;

        if self.inner.config.notifications_enabled {
            let listener = ReconnectLoop::with_state(
                Arc::clone(&self.inner.coordinator),
                self.inner.config.listener(),
                Arc::clone(&self.inner.connection_state),
            );
            let cancel = self.inner.cancel.child_token();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(listener.run(cancel)));
        }

        info!(
            host = %self.inner.config.host,
            devices = self.inner.coordinator.snapshot().len(),
            "connected to hub"
        );
        Ok(())
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "listener task failed");
            }
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Stopped);
        debug!("hub shut down");
    }

    // ── Data ─────────────────────────────────────────────────────────

    pub async fn refresh(&self) -> Result<Arc<DeviceSnapshot>, CoreError> {
        self.inner.coordinator.refresh().await
    }

    pub async fn execute(
        &self,
        id: PeripheralId,
        command: CoverCommand,
    ) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::HubDisconnected);
        }
        self.inner.coordinator.execute(id, command).await
    }

    // ── State observation ────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.inner.coordinator.snapshot()
    }

    pub fn device(&self, id: PeripheralId) -> Option<PeripheralRecord> {
        self.inner.coordinator.device(id)
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.coordinator.subscribe()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn health(&self) -> RefreshHealth {
        self.inner.coordinator.health()
    }

    pub fn is_available(&self, id: PeripheralId) -> bool {
        self.inner.coordinator.is_available(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeHub, Step, catalog_with, status_with};

    fn hub(fake: FakeHub, notifications: bool) -> (Arc<FakeHub>, Hub<FakeHub>) {
        let api = Arc::new(fake);
        let mut config = HubConfig::new("hub.test");
        config.notifications_enabled = notifications;
        (Arc::clone(&api), Hub::new(api, config))
    }

    #[tokio::test]
    async fn start_refreshes_before_returning() {
        let (api, hub) = hub(
            FakeHub::new(catalog_with(&[5, 6]), status_with(&[(5, Some(0))])),
            false,
        );

        hub.start().await.unwrap();

        assert_eq!(hub.snapshot().len(), 2);
        assert!(hub.is_available(PeripheralId(5)));
        assert!(!hub.is_available(PeripheralId(7)));
        assert_eq!(hub.device(PeripheralId(5)).unwrap().is_closed(), Some(true));
        assert!(api.session_opens().is_empty());
        assert_eq!(*hub.connection_state().borrow(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn start_fails_when_first_refresh_fails() {
        let (api, hub) = hub(
            FakeHub::new(catalog_with(&[5]), status_with(&[])),
            true,
        );
        api.fail_catalog(true);

        assert!(hub.start().await.is_err());
        assert!(api.session_opens().is_empty());
    }

    #[tokio::test]
    async fn shutdown_survives_a_panicked_task() {
        let (_api, hub) = hub(
            FakeHub::new(catalog_with(&[5]), status_with(&[(5, Some(50))])),
            false,
        );
        hub.start().await.unwrap();
        hub.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(async { panic!("listener crashed") }));

        hub.shutdown().await;

        assert_eq!(*hub.connection_state().borrow(), ConnectionState::Stopped);
        assert!(hub.inner.task_handles.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_listener() {
        let (api, hub) = hub(
            FakeHub::new(catalog_with(&[5]), status_with(&[(5, Some(50))]))
                .with_sessions(vec![vec![Step::Notify(5)]]),
            true,
        );
        let mut state = hub.connection_state();

        hub.start().await.unwrap();
        state
            .wait_for(|s| *s == ConnectionState::Streaming)
            .await
            .unwrap();
        while api.status_calls() < 2 {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        hub.shutdown().await;

        assert_eq!(*state.borrow(), ConnectionState::Stopped);
        assert_eq!(api.session_opens().len(), 1);
        assert!(matches!(
            hub.execute(PeripheralId(5), CoverCommand::Open).await,
            Err(CoreError::HubDisconnected)
        ));
    }

    #[tokio::test]
    async fn execute_goes_through_coordinator() {
        let (api, hub) = hub(
            FakeHub::new(catalog_with(&[5]), status_with(&[(5, Some(50))])),
            false,
        );
        hub.start().await.unwrap();

        hub.execute(PeripheralId(5), CoverCommand::SetPosition(30))
            .await
            .unwrap();

        assert_eq!(api.control_calls(), vec![(5, 30, 100)]);
        hub.shutdown().await;
    }
}
