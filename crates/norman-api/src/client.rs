// Hub HTTP client
//
// Wraps `reqwest::Client` with the hub's URL layout, per-request timeouts,
// and error-code checking. Every request/response endpoint is a plain
// POST → parse → check-code call; the notification long-poll is handed off
// to `NotificationSession`.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{
    CatalogRequest, CatalogResponse, ControlRequest, ControlResponse, RegistrationResponse,
    StatusResponse, TimestampRequest,
};
use crate::notification::{NotificationSession, SessionConfig};
use crate::transport::TransportConfig;

// ── Endpoints ────────────────────────────────────────────────────────

pub const REGISTRATION: &str = "registration";
pub const GET_ALL_PERIPHERAL: &str = "GetAllPeripheral";
pub const STATUS: &str = "status";
pub const CONTROL: &str = "control";
pub const NOTIFICATION: &str = "notification";

const API_PREFIX: &str = "/NM/v1";

/// Raw HTTP client for the hub's local API.
///
/// Registration is performed lazily: the first catalog fetch registers
/// and caches the hub's `ThingName`, which the catalog endpoint requires.
pub struct HubClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    thing_name: RwLock<Option<String>>,
}

impl HubClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the hub root, e.g. `http://192.168.1.20:10123`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, transport.request_timeout))
    }

    /// Create a client for `host` on the given port.
    pub fn for_host(host: &str, port: u16, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{host}:{port}"))?;
        Self::new(base_url, transport)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, request_timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            request_timeout,
            thing_name: RwLock::new(None),
        }
    }

    /// The hub base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `ThingName` captured by the last successful registration.
    pub fn thing_name(&self) -> Option<String> {
        self.thing_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Register with the hub and cache its `ThingName`.
    ///
    /// `POST /NM/v1/registration` with `{"Timestamp": ...}`
    pub async fn register(&self) -> Result<RegistrationResponse, Error> {
        let body = TimestampRequest {
            timestamp: unix_timestamp(),
        };
        let resp: RegistrationResponse = self.post(REGISTRATION, &body).await?;
        check_code(REGISTRATION, resp.error)?;

        debug!(thing_name = ?resp.thing_name, "registered with hub");
        *self
            .thing_name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = resp.thing_name.clone();
        Ok(resp)
    }

    /// Check that the hub is reachable and accepts registration.
    pub async fn validate(&self) -> Result<(), Error> {
        self.register().await.map(|_| ())
    }

    /// Fetch the full room → group → peripheral catalog.
    ///
    /// `POST /NM/v1/GetAllPeripheral`, registering first if needed.
    pub async fn get_all_peripherals(&self) -> Result<CatalogResponse, Error> {
        if self.thing_name().is_none() {
            self.register().await?;
        }

        let body = CatalogRequest {
            thing_name: self.thing_name(),
            task_id: task_id(),
            timestamp: unix_timestamp(),
        };
        let resp: CatalogResponse = self.post(GET_ALL_PERIPHERAL, &body).await?;

        if resp.status.code != 0 {
            let message = resp
                .status
                .error
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Unknown error".into());
            return Err(Error::HubStatus {
                endpoint: GET_ALL_PERIPHERAL,
                message,
            });
        }

        debug!(
            rooms = resp.rooms().len(),
            peripherals = resp.peripheral_count(),
            "fetched peripheral catalog"
        );
        Ok(resp)
    }

    /// Fetch live status for every peripheral.
    ///
    /// `POST /NM/v1/status` with `{"Timestamp": ...}`
    pub async fn get_status(&self) -> Result<StatusResponse, Error> {
        let body = TimestampRequest {
            timestamp: unix_timestamp(),
        };
        let resp: StatusResponse = self.post(STATUS, &body).await?;
        check_code(STATUS, resp.error)?;

        trace!(peripherals = resp.peripherals.len(), "fetched status");
        Ok(resp)
    }

    /// Move both rails of a peripheral.
    ///
    /// `POST /NM/v1/control`. Positions run 0 (closed) to 100 (open).
    pub async fn set_position(
        &self,
        peripheral_uid: i64,
        bottom_rail_position: i64,
        middle_rail_position: i64,
    ) -> Result<(), Error> {
        debug!(
            peripheral_uid,
            bottom_rail_position, middle_rail_position, "sending control request"
        );
        let body = ControlRequest {
            peripheral_uid,
            timestamp: unix_timestamp(),
            task_id: task_id(),
            bottom_rail_position,
            middle_rail_position,
        };
        let resp: ControlResponse = self.post(CONTROL, &body).await?;
        check_code(CONTROL, resp.error)
    }

    /// Prepare a notification long-poll session.
    ///
    /// The request is not sent until the session is first polled. It has
    /// no total timeout: the session's own lifetime bound replaces it.
    pub fn notifications(
        &self,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Result<NotificationSession, Error> {
        let url = self.endpoint_url(NOTIFICATION)?;
        let request = self.http.post(url.clone());
        Ok(NotificationSession::new(request, url, config, cancel))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build the full URL for an endpoint: `{base}/NM/v1/{endpoint}`.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{API_PREFIX}/{endpoint}"))?)
    }

    /// Send a POST with a JSON body and parse the JSON answer.
    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| self.classify(endpoint, e))?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                message: format!("{endpoint}: {e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    fn classify(&self, endpoint: &'static str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                endpoint,
                timeout_secs: self.request_timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn check_code(endpoint: &'static str, code: i64) -> Result<(), Error> {
    if code == 0 {
        Ok(())
    } else {
        Err(Error::HubError { endpoint, code })
    }
}

fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Task identifiers only need to differ between consecutive requests.
fn task_id() -> i64 {
    Utc::now().timestamp_millis().rem_euclid(10_000)
}
