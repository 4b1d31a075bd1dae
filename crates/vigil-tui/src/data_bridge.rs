//! Data bridge: connects [`Monitor`] streams to TUI actions.
//!
//! Runs as a background task. Starts the monitor, then forwards every
//! snapshot, frame and status sample as an [`Action`] through the TUI's
//! action channel until cancelled.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vigil_core::Monitor;

use crate::action::Action;

/// Start `monitor` and forward its streams until `cancel` fires.
pub async fn spawn_data_bridge(
    monitor: Monitor,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut snapshots = monitor.subscribe();
    let mut frames = monitor.frames();
    let mut status = monitor.system_status();

    if let Err(e) = monitor.start().await {
        warn!(error = %e, "failed to start monitor");
        let _ = action_tx.send(Action::MonitorFailed(e.to_string()));
        return;
    }

    // Push the initial state so screens render immediately
    let _ = action_tx.send(Action::SnapshotUpdated(snapshots.latest()));
    let _ = action_tx.send(Action::StatusUpdated(*status.borrow_and_update()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(snapshot) = snapshots.changed() => {
                debug!(version = snapshot.version, "dispatching SnapshotUpdated");
                let _ = action_tx.send(Action::SnapshotUpdated(snapshot));
            }
            Ok(()) = frames.changed() => {
                let frame = frames.borrow_and_update().clone();
                if let Some(frame) = frame {
                    let _ = action_tx.send(Action::FrameReceived(frame));
                }
            }
            Ok(()) = status.changed() => {
                let sample = *status.borrow_and_update();
                let _ = action_tx.send(Action::StatusUpdated(sample));
            }
        }
    }

    monitor.shutdown().await;
    debug!("data bridge shut down");
}
