// ── Scripted hub for unit tests ──

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use norman_api::models::{CatalogResponse, StatusResponse};
use norman_api::{Notification, SessionConfig, SessionEnd, SessionEvent};
use serde_json::json;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::hub_api::{HubApi, NotificationSource};

/// One scripted step of a fake notification session.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Notify(i64),
    PeriodicReconnect,
    Fail,
    Closed,
}

#[derive(Default)]
struct FakeState {
    catalog: CatalogResponse,
    status: StatusResponse,
    fail_catalog: bool,
    fail_status: bool,
    fail_control: bool,
    catalog_calls: usize,
    status_times: Vec<Instant>,
    control_calls: Vec<(i64, i64, i64)>,
    sessions: VecDeque<Vec<Step>>,
    session_opens: Vec<Instant>,
}

pub(crate) struct FakeHub {
    state: Mutex<FakeState>,
    status_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeHub {
    pub fn new(catalog: CatalogResponse, status: StatusResponse) -> Self {
        Self {
            state: Mutex::new(FakeState {
                catalog,
                status,
                ..FakeState::default()
            }),
            status_delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn with_sessions(self, sessions: Vec<Vec<Step>>) -> Self {
        self.state.lock().unwrap().sessions = sessions.into();
        self
    }

    pub fn set_status(&self, status: StatusResponse) {
        self.state.lock().unwrap().status = status;
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.state.lock().unwrap().fail_catalog = fail;
    }

    pub fn fail_status(&self, fail: bool) {
        self.state.lock().unwrap().fail_status = fail;
    }

    pub fn fail_control(&self, fail: bool) {
        self.state.lock().unwrap().fail_control = fail;
    }

    pub fn catalog_calls(&self) -> usize {
        self.state.lock().unwrap().catalog_calls
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_times.len()
    }

    pub fn status_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().status_times.clone()
    }

    pub fn control_calls(&self) -> Vec<(i64, i64, i64)> {
        self.state.lock().unwrap().control_calls.clone()
    }

    pub fn session_opens(&self) -> Vec<Instant> {
        self.state.lock().unwrap().session_opens.clone()
    }

    pub fn max_concurrent_status(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn unreachable_hub(endpoint: &'static str) -> norman_api::Error {
    norman_api::Error::Timeout {
        endpoint,
        timeout_secs: 10,
    }
}

impl HubApi for FakeHub {
    type Session = FakeSession;

    async fn fetch_catalog(&self) -> Result<CatalogResponse, norman_api::Error> {
        let mut state = self.state.lock().unwrap();
        state.catalog_calls += 1;
        if state.fail_catalog {
            return Err(unreachable_hub("GetAllPeripheral"));
        }
        Ok(state.catalog.clone())
    }

    async fn fetch_status(&self) -> Result<StatusResponse, norman_api::Error> {
        self.state.lock().unwrap().status_times.push(Instant::now());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let state = self.state.lock().unwrap();
        if state.fail_status {
            return Err(unreachable_hub("status"));
        }
        Ok(state.status.clone())
    }

    async fn send_position(
        &self,
        id: i64,
        bottom_rail_position: i64,
        middle_rail_position: i64,
    ) -> Result<(), norman_api::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_control {
            return Err(norman_api::Error::HubError {
                endpoint: "control",
                code: 1,
            });
        }
        state
            .control_calls
            .push((id, bottom_rail_position, middle_rail_position));
        Ok(())
    }

    fn open_session(
        &self,
        _config: SessionConfig,
        cancel: CancellationToken,
    ) -> Result<FakeSession, norman_api::Error> {
        let mut state = self.state.lock().unwrap();
        state.session_opens.push(Instant::now());
        let steps = state.sessions.pop_front().unwrap_or_default();
        Ok(FakeSession {
            steps: steps.into(),
            cancel,
        })
    }
}

/// Plays its steps, then waits for cancellation.
pub(crate) struct FakeSession {
    steps: VecDeque<Step>,
    cancel: CancellationToken,
}

impl NotificationSource for FakeSession {
    async fn next_event(&mut self) -> SessionEvent {
        if self.cancel.is_cancelled() {
            return SessionEvent::End(SessionEnd::Cancelled);
        }
        match self.steps.pop_front() {
            Some(Step::Notify(id)) => SessionEvent::Notification(Notification {
                peripheral_list: json!([{ "PeripheralUID": id }]),
                extra: serde_json::Map::new(),
            }),
            Some(Step::PeriodicReconnect) => SessionEvent::End(SessionEnd::PeriodicReconnect),
            Some(Step::Fail) => {
                SessionEvent::End(SessionEnd::ConnectionFailed(unreachable_hub("notification")))
            }
            Some(Step::Closed) => SessionEvent::End(SessionEnd::Closed),
            None => {
                self.cancel.cancelled().await;
                SessionEvent::End(SessionEnd::Cancelled)
            }
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

/// A catalog with one room and one group holding the given IDs.
pub(crate) fn catalog_with(ids: &[i64]) -> CatalogResponse {
    let peripherals: Vec<_> = ids
        .iter()
        .map(|id| json!({ "PeripheralUID": id, "PeripheralName": format!("Blind {id}") }))
        .collect();
    serde_json::from_value(json!({
        "status": { "code": 0 },
        "results": { "RoomList": [{
            "RoomID": 1,
            "RoomName": "Den",
            "GroupList": [{ "GroupID": 2, "GroupName": "G", "PeripheralList": peripherals }]
        }]}
    }))
    .unwrap()
}

/// A status response with the given bottom-rail positions.
pub(crate) fn status_with(entries: &[(i64, Option<i64>)]) -> StatusResponse {
    let peripherals: Vec<_> = entries
        .iter()
        .map(|(id, bottom)| json!({ "PeripheralUID": id, "BottomRailPosition": bottom }))
        .collect();
    serde_json::from_value(json!({ "Error": 0, "Peripherals": peripherals })).unwrap()
}
