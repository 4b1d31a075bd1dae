// ── Monitor service ──
//
// Lifecycle for one monitoring backend: opens both live channels, runs
// the reconcile task that owns dashboard state, loads the historical
// alert batch, and ticks the status bar. Request/response endpoints
// (report, search) are available without starting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use vigil_api::{ChannelHandle, MonitorClient, SearchClient};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::{Alert, AlertOrigin, BehaviorReport, Frame, SystemStatus};
use crate::reconcile::{Applied, ChannelKind, Command, DashboardSnapshot, Reconciler};
use crate::stream::SnapshotStream;

const STATUS_TICK: Duration = Duration::from_secs(1);

/// Handle to a monitoring backend.
///
/// Cheaply cloneable. A monitor is started at most once; after
/// [`shutdown()`](Self::shutdown) build a new one.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: MonitorClient,
    search: SearchClient,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    frame_tx: watch::Sender<Option<Arc<Frame>>>,
    status_tx: watch::Sender<SystemStatus>,
    command_tx: mpsc::UnboundedSender<Command>,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
    running: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Build a monitor. Does not connect; call [`start()`](Self::start).
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let client = MonitorClient::new(config.server.clone(), &transport)?;
        let search = SearchClient::new(config.search.clone(), &transport)?;

        let (snapshot_tx, _) = watch::channel(Arc::new(DashboardSnapshot::default()));
        let (frame_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(SystemStatus::sample());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                search,
                snapshot_tx,
                frame_tx,
                status_tx,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                running: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The warning clip URL without a cache buster.
    pub fn warning_clip_base(&self) -> Result<Url, CoreError> {
        let mut url = self.inner.client.warning_clip_url(0)?;
        url.set_query(None);
        Ok(url)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Open both channels and spawn the background tasks.
    pub async fn start(&self) -> Result<(), CoreError> {
        let Some(command_rx) = self.inner.command_rx.lock().await.take() else {
            return Err(CoreError::AlreadyStarted);
        };

        let config = &self.inner.config;
        let cancel = &self.inner.cancel;

        let reconciler = Reconciler::new(self.warning_clip_base()?);
        let video = ChannelHandle::connect(
            ChannelKind::Video.as_str(),
            self.inner.client.video_feed_url()?,
            config.video_reconnect.clone(),
            cancel,
        );
        let alerts = ChannelHandle::connect(
            ChannelKind::Alerts.as_str(),
            self.inner.client.alerts_url()?,
            config.alert_reconnect.clone(),
            cancel,
        );

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(reconcile_task(
            self.clone(),
            reconciler,
            video,
            alerts,
            command_rx,
        )));
        handles.push(tokio::spawn(status_tick_task(self.clone())));
        if config.load_history {
            handles.push(tokio::spawn(historical_fetch_task(self.clone())));
        }

        self.inner.running.store(true, Ordering::Release);
        info!(server = %config.server, "monitor started");
        Ok(())
    }

    /// Cancel every background task and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.running.store(false, Ordering::Release);
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot_tx.subscribe())
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Latest video frame. Frames never pass through the snapshot.
    pub fn frames(&self) -> watch::Receiver<Option<Arc<Frame>>> {
        self.inner.frame_tx.subscribe()
    }

    /// Status bar values, re-sampled every second while running.
    pub fn system_status(&self) -> watch::Receiver<SystemStatus> {
        self.inner.status_tx.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Clear the behavior history and counters.
    pub fn reset(&self) -> Result<(), CoreError> {
        self.send(Command::Reset)
    }

    fn send(&self, command: Command) -> Result<(), CoreError> {
        if !self.is_running() {
            return Err(CoreError::NotRunning);
        }
        self.inner
            .command_tx
            .send(command)
            .map_err(|_| CoreError::NotRunning)
    }

    // ── Request/response ─────────────────────────────────────────

    /// Fetch the historical alert batch in backend order.
    pub async fn list_alerts(&self) -> Result<Vec<Alert>, CoreError> {
        let payloads = self.inner.client.list_alerts().await?;
        Ok(payloads
            .into_iter()
            .map(|p| Alert::from_payload(p, AlertOrigin::Historical))
            .collect())
    }

    pub async fn behavior_report(&self) -> Result<BehaviorReport, CoreError> {
        Ok(self.inner.client.behavior_data().await?.into())
    }

    /// Ask the search backend. Surrounding whitespace is trimmed and an
    /// empty question is rejected without a request.
    pub async fn ask(&self, question: &str, k: u32) -> Result<String, CoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CoreError::EmptyQuestion);
        }
        debug!(k, "asking search backend");
        Ok(self.inner.search.ask(question, k).await?)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Single owner of dashboard state. Applies channel events and commands
/// one at a time and publishes the result.
async fn reconcile_task(
    monitor: Monitor,
    mut reconciler: Reconciler,
    mut video: ChannelHandle,
    mut alerts: ChannelHandle,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let cancel = monitor.inner.cancel.clone();
    monitor
        .inner
        .snapshot_tx
        .send_replace(Arc::new(reconciler.snapshot()));

    loop {
        let applied = tokio::select! {
            () = cancel.cancelled() => break,
            Some(command) = commands.recv() => reconciler.apply_command(command),
            Some(event) = video.next() => reconciler.apply(ChannelKind::Video, event),
            Some(event) = alerts.next() => reconciler.apply(ChannelKind::Alerts, event),
            else => break,
        };

        match applied {
            Applied::Snapshot => {
                monitor
                    .inner
                    .snapshot_tx
                    .send_replace(Arc::new(reconciler.snapshot()));
            }
            Applied::Frame(frame) => {
                monitor.inner.frame_tx.send_replace(Some(frame));
            }
            Applied::Ignored => {}
        }
    }

    video.shutdown();
    alerts.shutdown();
    debug!("reconcile task exiting");
}

/// Load the startup alert batch once.
async fn historical_fetch_task(monitor: Monitor) {
    let cancel = monitor.inner.cancel.clone();
    let result = tokio::select! {
        () = cancel.cancelled() => return,
        result = monitor.list_alerts() => result,
    };

    let command = match result {
        Ok(alerts) => Command::Historical(alerts),
        Err(e) => {
            warn!(error = %e, "historical alert fetch failed");
            Command::HistoricalFailed(e.to_string())
        }
    };
    let _ = monitor.inner.command_tx.send(command);
}

/// Re-sample the synthetic status values every second.
async fn status_tick_task(monitor: Monitor) {
    let cancel = monitor.inner.cancel.clone();
    let mut interval = tokio::time::interval(STATUS_TICK);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                monitor.inner.status_tx.send_replace(SystemStatus::sample());
            }
        }
    }
}
