// One notification long-poll connection with a bounded lifetime
//
// Pull-based: each `next_event()` call races the next body chunk against
// the lifetime deadline and the cancellation token. The losing futures are
// dropped inside `select!`, so nothing outlives the call.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

use super::{Notification, StreamFramer};
use crate::client::NOTIFICATION;
use crate::error::Error;

// ── SessionConfig ────────────────────────────────────────────────────

/// Lifetime and read sizing for one notification connection.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum wall-clock lifetime of one connection. Default: 300s.
    pub max_duration: Duration,
    /// Upper bound on bytes handed to the framer at once. Default: 1024.
    pub read_chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(300),
            read_chunk_size: 1024,
        }
    }
}

// ── Events ───────────────────────────────────────────────────────────

/// What a call to [`NotificationSession::next_event`] produced.
#[derive(Debug)]
pub enum SessionEvent {
    /// A device-state notification, delivered in arrival order.
    Notification(Notification),
    /// The session is over. Every later call repeats [`SessionEnd::Closed`].
    End(SessionEnd),
}

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The lifetime bound elapsed. A scheduled cycle, not a failure.
    PeriodicReconnect,
    /// The hub ended the response body.
    Closed,
    /// The caller's cancellation token fired.
    Cancelled,
    /// The connection could not be opened or broke mid-stream.
    ConnectionFailed(Error),
}

impl SessionEnd {
    /// `true` when the loop should back off before reconnecting.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Closed)
    }
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeriodicReconnect => f.write_str("periodic reconnect"),
            Self::Closed => f.write_str("closed by hub"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::ConnectionFailed(e) => write!(f, "connection failed: {e}"),
        }
    }
}

// ── NotificationSession ──────────────────────────────────────────────

enum Phase {
    /// Request built, not yet sent.
    Pending(reqwest::RequestBuilder),
    /// Headers received, body streaming.
    Streaming(reqwest::Response),
    Finished,
}

/// One long-poll connection to `POST /NM/v1/notification`.
///
/// Created by [`HubClient::notifications`](crate::HubClient::notifications).
/// The lifetime clock starts at creation; the request itself is sent on
/// the first [`next_event`](Self::next_event) call. Dropping the session
/// closes the connection.
pub struct NotificationSession {
    phase: Phase,
    url: Url,
    config: SessionConfig,
    cancel: CancellationToken,
    deadline: Instant,
    framer: StreamFramer,
    ready: VecDeque<Notification>,
    unread: Bytes,
}

impl NotificationSession {
    pub(crate) fn new(
        request: reqwest::RequestBuilder,
        url: Url,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Self {
        let deadline = Instant::now() + config.max_duration;
        Self {
            phase: Phase::Pending(request),
            url,
            config,
            cancel,
            deadline,
            framer: StreamFramer::new(),
            ready: VecDeque::new(),
            unread: Bytes::new(),
        }
    }

    /// The notification endpoint this session talks to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `true` once an end event has been returned.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Wait for the next notification or the end of the session.
    pub async fn next_event(&mut self) -> SessionEvent {
        loop {
            if self.cancel.is_cancelled() && !self.is_finished() {
                return self.finish(SessionEnd::Cancelled);
            }

            if let Some(notification) = self.ready.pop_front() {
                return SessionEvent::Notification(notification);
            }

            if !self.unread.is_empty() {
                let take = self.config.read_chunk_size.max(1).min(self.unread.len());
                let piece = self.unread.split_to(take);
                self.ready.extend(self.framer.feed(&piece));
                continue;
            }

            match std::mem::replace(&mut self.phase, Phase::Finished) {
                Phase::Pending(request) => {
                    if let Err(end) = self.open(request).await {
                        return self.finish(end);
                    }
                }
                Phase::Streaming(mut response) => {
                    let outcome = tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => Err(SessionEnd::Cancelled),
                        () = sleep_until(self.deadline) => Err(SessionEnd::PeriodicReconnect),
                        chunk = response.chunk() => match chunk {
                            Ok(Some(bytes)) => Ok(bytes),
                            Ok(None) => Err(SessionEnd::Closed),
                            Err(e) => Err(SessionEnd::ConnectionFailed(Error::Transport(e))),
                        },
                    };

                    match outcome {
                        Ok(bytes) => {
                            trace!(len = bytes.len(), "notification chunk");
                            self.unread = bytes;
                            self.phase = Phase::Streaming(response);
                        }
                        Err(end) => {
                            drop(response);
                            return self.finish(end);
                        }
                    }
                }
                Phase::Finished => return SessionEvent::End(SessionEnd::Closed),
            }
        }
    }

    /// Send the request and move to streaming, still honouring the
    /// deadline and the cancellation token while waiting for headers.
    async fn open(&mut self, request: reqwest::RequestBuilder) -> Result<(), SessionEnd> {
        debug!(url = %self.url, "opening notification stream");

        let response = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(SessionEnd::Cancelled),
            () = sleep_until(self.deadline) => return Err(SessionEnd::PeriodicReconnect),
            result = request.send() => result.map_err(|e| SessionEnd::ConnectionFailed(Error::Transport(e)))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SessionEnd::ConnectionFailed(Error::HttpStatus {
                endpoint: NOTIFICATION,
                status: status.as_u16(),
            }));
        }

        info!(url = %self.url, "notification stream open");
        self.framer.reset();
        self.phase = Phase::Streaming(response);
        Ok(())
    }

    fn finish(&mut self, end: SessionEnd) -> SessionEvent {
        self.phase = Phase::Finished;
        self.ready.clear();
        self.unread = Bytes::new();
        self.framer.reset();
        debug!(reason = %end, "notification session ended");
        SessionEvent::End(end)
    }
}

impl fmt::Debug for NotificationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSession")
            .field("url", &self.url.as_str())
            .field("finished", &self.is_finished())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
