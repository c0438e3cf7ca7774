// ── Reactive snapshot stream ──
//
// Subscription type for consuming published device snapshots.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::DeviceSnapshot;

/// A subscription to the coordinator's published snapshot.
///
/// Provides both point-in-time access and change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct SnapshotStream {
    current: Arc<DeviceSnapshot>,
    receiver: watch::Receiver<Arc<DeviceSnapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<DeviceSnapshot>>) -> Self {
        let current = Arc::clone(&receiver.borrow_and_update());
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<DeviceSnapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<DeviceSnapshot> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Wait for the next publication. `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<Arc<DeviceSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = Arc::clone(&self.receiver.borrow_and_update());
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` that yields the current snapshot first,
    /// then every later publication.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<DeviceSnapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<DeviceSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{PeripheralId, PeripheralRecord};
    use futures_util::StreamExt;

    fn snapshot(ids: &[i64]) -> Arc<DeviceSnapshot> {
        Arc::new(
            ids.iter()
                .map(|&id| PeripheralRecord::minimal(PeripheralId(id)))
                .collect(),
        )
    }

    #[tokio::test]
    async fn changed_tracks_latest_publication() {
        let (tx, rx) = watch::channel(snapshot(&[5]));
        let mut stream = SnapshotStream::new(rx);
        assert_eq!(stream.current().len(), 1);

        tx.send_replace(snapshot(&[5, 6]));
        let next = stream.changed().await.unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(stream.current().len(), 2);

        drop(tx);
        assert!(stream.changed().await.is_none());
    }

    #[tokio::test]
    async fn into_stream_yields_current_first() {
        let (tx, rx) = watch::channel(snapshot(&[5]));
        let mut stream = SnapshotStream::new(rx).into_stream();

        assert_eq!(stream.next().await.unwrap().len(), 1);
        tx.send_replace(snapshot(&[5, 6, 7]));
        assert_eq!(stream.next().await.unwrap().len(), 3);

        drop(tx);
        assert!(stream.next().await.is_none());
    }
}
