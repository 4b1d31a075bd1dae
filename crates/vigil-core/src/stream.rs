// ── Reactive snapshot stream ──
//
// Subscription handle over the dashboard `watch` channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::reconcile::DashboardSnapshot;

/// A subscription to dashboard snapshots.
///
/// Provides point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`.
pub struct SnapshotStream {
    current: Arc<DashboardSnapshot>,
    receiver: watch::Receiver<Arc<DashboardSnapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<DashboardSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot seen last by this subscription.
    pub fn current(&self) -> &Arc<DashboardSnapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<DashboardSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the monitor is gone.
    pub async fn changed(&mut self) -> Option<Arc<DashboardSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding each published snapshot.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<DashboardSnapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<DashboardSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
