// ── Hub access seam ──
//
// The coordinator and listener only need four hub calls and a pull-based
// notification session. Putting them behind traits lets tests script the
// hub without a socket.

use std::future::Future;

use norman_api::models::{CatalogResponse, StatusResponse};
use norman_api::{HubClient, NotificationSession, SessionConfig, SessionEvent};
use tokio_util::sync::CancellationToken;

/// The hub operations the core layer depends on.
pub trait HubApi: Send + Sync + 'static {
    type Session: NotificationSource;

    fn fetch_catalog(
        &self,
    ) -> impl Future<Output = Result<CatalogResponse, norman_api::Error>> + Send;

    fn fetch_status(&self) -> impl Future<Output = Result<StatusResponse, norman_api::Error>> + Send;

    fn send_position(
        &self,
        id: i64,
        bottom_rail_position: i64,
        middle_rail_position: i64,
    ) -> impl Future<Output = Result<(), norman_api::Error>> + Send;

    /// Prepare one notification session. No I/O happens until it is polled.
    fn open_session(
        &self,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Result<Self::Session, norman_api::Error>;
}

/// A pull-based sequence of notifications ending in one end signal.
pub trait NotificationSource: Send {
    fn next_event(&mut self) -> impl Future<Output = SessionEvent> + Send;
}

impl HubApi for HubClient {
    type Session = NotificationSession;

    fn fetch_catalog(
        &self,
    ) -> impl Future<Output = Result<CatalogResponse, norman_api::Error>> + Send {
        self.get_all_peripherals()
    }

    fn fetch_status(&self) -> impl Future<Output = Result<StatusResponse, norman_api::Error>> + Send {
        self.get_status()
    }

    fn send_position(
        &self,
        id: i64,
        bottom_rail_position: i64,
        middle_rail_position: i64,
    ) -> impl Future<Output = Result<(), norman_api::Error>> + Send {
        self.set_position(id, bottom_rail_position, middle_rail_position)
    }

    fn open_session(
        &self,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Result<Self::Session, norman_api::Error> {
        self.notifications(config, cancel)
    }
}

impl NotificationSource for NotificationSession {
    fn next_event(&mut self) -> impl Future<Output = SessionEvent> + Send {
        NotificationSession::next_event(self)
    }
}
