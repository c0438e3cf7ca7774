// ── Data coordinator ──
//
// Owns the cached catalog and the published snapshot. Refreshes are
// serialized by the catalog mutex: whoever holds it is the only writer,
// and readers only ever see whole snapshots through the watch channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use norman_api::models::CatalogResponse;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::command::{CommandResult, CoverCommand};
use crate::error::CoreError;
use crate::hub_api::HubApi;
use crate::merge::merge;
use crate::model::{DeviceSnapshot, PeripheralId, PeripheralRecord};
use crate::stream::SnapshotStream;

/// Outcome of the most recent refresh attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshHealth {
    /// `false` until the first successful refresh, and after any failure.
    pub last_success: bool,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Fetches, merges and publishes device state for one hub.
pub struct DataCoordinator<H: HubApi> {
    api: Arc<H>,
    catalog: Mutex<Option<Arc<CatalogResponse>>>,
    snapshot: watch::Sender<Arc<DeviceSnapshot>>,
    health: watch::Sender<RefreshHealth>,
}

impl<H: HubApi> DataCoordinator<H> {
    pub fn new(api: Arc<H>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(DeviceSnapshot::default()));
        let (health, _) = watch::channel(RefreshHealth::default());
        Self {
            api,
            catalog: Mutex::new(None),
            snapshot,
            health,
        }
    }

    pub fn api(&self) -> &Arc<H> {
        &self.api
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch status (and the catalog, the first time), merge, and publish.
    ///
    /// Concurrent callers queue behind each other. On failure nothing
    /// published changes and the error is returned as-is, unretried.
    pub async fn refresh(&self) -> Result<Arc<DeviceSnapshot>, CoreError> {
        let mut cached = self.catalog.lock().await;
        let result = self.refresh_locked(&mut cached).await;

        // Health is written before the lock is released.
        let now = Utc::now();
        match &result {
            Ok(snapshot) => {
                debug!(devices = snapshot.len(), "refresh complete");
                self.health.send_replace(RefreshHealth {
                    last_success: true,
                    last_attempt: Some(now),
                    last_error: None,
                });
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                self.health.send_replace(RefreshHealth {
                    last_success: false,
                    last_attempt: Some(now),
                    last_error: Some(e.to_string()),
                });
            }
        }
        drop(cached);
        result
    }

    async fn refresh_locked(
        &self,
        cached: &mut Option<Arc<CatalogResponse>>,
    ) -> Result<Arc<DeviceSnapshot>, CoreError> {
        let catalog = if let Some(catalog) = cached.as_ref() {
            Arc::clone(catalog)
        } else {
            let catalog = Arc::new(self.api.fetch_catalog().await?);
            info!(
                peripherals = catalog.peripheral_count(),
                "cached peripheral catalog"
            );
            *cached = Some(Arc::clone(&catalog));
            catalog
        };

        let status = self.api.fetch_status().await?;
        let snapshot = Arc::new(merge(&catalog, &status));
        self.snapshot.send_replace(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// `true` once the catalog has been fetched.
    pub async fn has_catalog(&self) -> bool {
        self.catalog.lock().await.is_some()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Resolve and send one cover command, then refresh.
    ///
    /// A refresh failure after a successful control request is logged,
    /// not returned: the movement itself went through.
    pub async fn execute(
        &self,
        id: PeripheralId,
        command: CoverCommand,
    ) -> Result<CommandResult, CoreError> {
        command.validate()?;

        let record = self
            .device(id)
            .ok_or(CoreError::DeviceNotFound { id: id.get() })?;

        let capability = command.required_capability();
        if !record.device_type.supports(capability) {
            return Err(CoreError::Unsupported {
                operation: command.action().into(),
                required: format!("{capability} capability"),
            });
        }

        let Some(target) = command.resolve(&record) else {
            debug!(%id, "stop requested with unknown position, nothing to send");
            return Ok(CommandResult::Skipped);
        };

        debug!(%id, action = command.action(), ?target, "executing cover command");
        self.api
            .send_position(id.get(), target.bottom, target.middle)
            .await?;

        if let Err(e) = self.refresh().await {
            warn!(%id, error = %e, "refresh after cover command failed");
        }
        Ok(CommandResult::Sent { target })
    }

    // ── State observation ────────────────────────────────────────────

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn device(&self, id: PeripheralId) -> Option<PeripheralRecord> {
        self.snapshot.borrow().get(id).cloned()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    pub fn health(&self) -> RefreshHealth {
        self.health.borrow().clone()
    }

    pub fn health_updates(&self) -> watch::Receiver<RefreshHealth> {
        self.health.subscribe()
    }

    pub fn last_refresh_succeeded(&self) -> bool {
        self.health.borrow().last_success
    }

    /// A device is available when the last refresh succeeded and it is in
    /// the published snapshot.
    pub fn is_available(&self, id: PeripheralId) -> bool {
        self.last_refresh_succeeded() && self.snapshot.borrow().contains(id)
    }
}
