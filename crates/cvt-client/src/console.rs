//! Live container console: log tailing, state polling and lifecycle actions.
//!
//! A [`ContainerConsole`] owns two tasks while it is open:
//!
//! - the **tail** task reads the build-log stream and folds every line into
//!   the shared [`BuildLog`]; reconciliation requests produced by sentinel
//!   lines are forwarded to the poller. A dropped stream is reopened. Records
//!   without a build id are not tailed;
//! - the **poll** task refreshes the lifecycle state on a fixed interval
//!   while no build runs and a runtime id is known. A forwarded
//!   reconciliation fires at its own deadline and restarts the interval.
//!
//! Both tasks stop when the console is closed, reopened or dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cvt_core::build_log::Effect;
use cvt_core::i18n;
use cvt_core::{Action, BuildLog, ContainerRecord, StreamEvent};
use futures::StreamExt;
use futures::stream::BoxStream;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::http::ApiClient;
use crate::notify::{Notification, Notifier};
use crate::query::QueryKey;
use crate::sse::SseEvent;

struct Shared {
    log: Mutex<BuildLog>,
    open: AtomicBool,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn update<R>(&self, f: impl FnOnce(&mut BuildLog) -> R) -> R {
        let out = f(&mut self.log.lock());
        self.revision.send_modify(|n| *n = n.wrapping_add(1));
        out
    }
}

struct Running {
    record: ContainerRecord,
    cancel: CancellationToken,
    tail_cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Log viewer and lifecycle controls for one container record.
pub struct ContainerConsole {
    client: ApiClient,
    shared: Arc<Shared>,
    notifier: Arc<dyn Notifier>,
    running: Mutex<Option<Running>>,
}

impl std::fmt::Debug for ContainerConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerConsole")
            .field("target", &self.shared.log.lock().target())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl ContainerConsole {
    /// Open the console on `record`. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn open(client: ApiClient, record: ContainerRecord, notifier: Arc<dyn Notifier>) -> Self {
        let lang = client.config().lang;
        let (revision, _) = watch::channel(0);
        let console = Self {
            client,
            shared: Arc::new(Shared {
                log: Mutex::new(BuildLog::new(&record, lang)),
                open: AtomicBool::new(false),
                revision,
            }),
            notifier,
            running: Mutex::new(None),
        };
        console.start(record);
        console
    }

    /// Point the console at `record`, discarding the previous transcript.
    pub fn reopen(&self, record: ContainerRecord) {
        self.halt();
        self.start(record);
    }

    /// Stop tailing and polling.
    pub fn close(&self) {
        self.halt();
        self.shared.update(|_| ());
    }

    /// Stop reading the log stream; state polling continues.
    pub fn stop_tailing(&self) {
        if let Some(running) = self.running.lock().as_ref() {
            running.tail_cancel.cancel();
        }
        self.shared.update(BuildLog::stop_tailing);
    }

    /// Whether the console is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BuildLog {
        self.shared.log.lock().clone()
    }

    /// Read the current state without copying it.
    pub fn with_log<R>(&self, f: impl FnOnce(&BuildLog) -> R) -> R {
        f(&self.shared.log.lock())
    }

    /// A receiver that changes whenever the state does.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Wait until `done` holds for the state.
    pub async fn wait_until(&self, mut done: impl FnMut(&BuildLog) -> bool) {
        let mut rx = self.subscribe();
        loop {
            if done(&self.shared.log.lock()) {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Run a lifecycle action against the runtime container.
    ///
    /// # Errors
    ///
    /// Returns [`cvt_core::CoreError::ActionUnavailable`] when the controls
    /// are gated, or the request failure. Failures are not retried.
    pub async fn run_action(&self, action: Action) -> Result<()> {
        let lang = self.client.config().lang;
        let runtime_id = self.shared.update(|log| log.begin_action(action))?;
        info!(%action, runtime_id, "running container action");

        let result = self.client.containers().action(action, &runtime_id).await;
        match &result {
            Ok(()) => {
                if action.refreshes_state() {
                    poll_once(&self.client, &self.shared).await;
                }
                self.shared.update(BuildLog::finish_action);
                self.notifier
                    .notify(Notification::success(i18n::action_result(lang, action, true)));
                if action.closes_viewer() {
                    self.close();
                }
            }
            Err(e) => {
                warn!(%action, runtime_id, error = %e, "container action failed");
                self.shared.update(BuildLog::finish_action);
                self.notifier.notify(Notification::error(
                    i18n::action_result(lang, action, false),
                    e.to_string(),
                ));
            }
        }
        result
    }

    /// Record the console is showing.
    #[must_use]
    pub fn record(&self) -> Option<ContainerRecord> {
        self.running.lock().as_ref().map(|r| r.record.clone())
    }

    fn start(&self, record: ContainerRecord) {
        self.shared.update(|log| log.reset(&record));
        self.shared.open.store(true, Ordering::Release);

        let cancel = CancellationToken::new();
        let tail_cancel = cancel.child_token();
        let (reconcile_tx, reconcile_rx) = mpsc::unbounded_channel();

        let mut tasks = Vec::with_capacity(2);
        if record.build_id.trim().is_empty() {
            debug!(target = %record.display_name(), "no build id, not tailing");
        } else {
            tasks.push(tokio::spawn(tail(
                self.client.clone(),
                record.build_id.clone(),
                Arc::clone(&self.shared),
                reconcile_tx,
                tail_cancel.clone(),
            )));
        }
        tasks.push(tokio::spawn(poll(
            self.client.clone(),
            Arc::clone(&self.shared),
            reconcile_rx,
            cancel.clone(),
        )));
        debug!(target = %record.display_name(), "console opened");

        *self.running.lock() = Some(Running {
            record,
            cancel,
            tail_cancel,
            tasks,
        });
    }

    fn halt(&self) {
        self.shared.open.store(false, Ordering::Release);
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
            for task in running.tasks {
                task.abort();
            }
            debug!(target = %running.record.display_name(), "console closed");
        }
    }
}

impl Drop for ContainerConsole {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Follow the log stream, reopening it after a drop until cancelled.
///
/// An error status on open ends tailing for good; transport failures and
/// closed streams are retried after the configured delay, or the `retry:`
/// value the server sent last.
async fn tail(
    client: ApiClient,
    build_id: String,
    shared: Arc<Shared>,
    reconcile: mpsc::UnboundedSender<Duration>,
    cancel: CancellationToken,
) {
    let containers = client.containers();
    let mut retry = client.config().stream_retry_delay;
    loop {
        let opened = tokio::select! {
            () = cancel.cancelled() => return,
            opened = containers.logs(&build_id) => opened,
        };
        match opened {
            Ok(stream) => {
                shared.update(|log| log.apply(StreamEvent::Opened));
                let Some(ended) = read(stream, &shared, &reconcile, &cancel, &mut retry).await else {
                    return;
                };
                shared.update(|log| log.apply(ended));
            }
            Err(e) => {
                let fatal = e.status().is_some();
                shared.update(|log| log.apply(StreamEvent::Error(e.to_string())));
                if fatal {
                    return;
                }
            }
        }
        debug!(build_id, delay_ms = retry.as_millis(), "reopening log stream");
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(retry) => {}
        }
    }
}

/// Fold one open stream into the log. Returns how it ended, or `None` when
/// cancelled.
async fn read(
    mut stream: BoxStream<'static, Result<SseEvent>>,
    shared: &Shared,
    reconcile: &mpsc::UnboundedSender<Duration>,
    cancel: &CancellationToken,
    retry: &mut Duration,
) -> Option<StreamEvent> {
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => return None,
            next = stream.next() => next,
        };
        let event = match next {
            Some(Ok(event)) => event,
            Some(Err(e)) => return Some(StreamEvent::Error(e.to_string())),
            None => return Some(StreamEvent::Closed),
        };
        if let Some(delay) = event.retry {
            *retry = delay;
        }
        if !event.is_message() {
            continue;
        }
        let effects = shared.update(|log| {
            event
                .data
                .lines()
                .flat_map(|line| log.apply(StreamEvent::Line(line.to_string())))
                .collect::<Vec<_>>()
        });
        for Effect::Reconcile(delay) in effects {
            let _ = reconcile.send(delay);
        }
    }
}

async fn poll(
    client: ApiClient,
    shared: Arc<Shared>,
    mut reconcile: mpsc::UnboundedReceiver<Duration>,
    cancel: CancellationToken,
) {
    let period = client.config().state_poll_interval;
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending: Vec<Instant> = Vec::new();
    let mut reconcile_open = true;

    loop {
        let next_forced = pending.iter().min().copied();
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => poll_once(&client, &shared).await,
            delay = reconcile.recv(), if reconcile_open => match delay {
                Some(delay) => pending.push(Instant::now() + delay),
                None => reconcile_open = false,
            },
            () = tokio::time::sleep_until(next_forced.unwrap_or_else(Instant::now)), if next_forced.is_some() => {
                if let Some(pos) = pending.iter().position(|at| Some(*at) == next_forced) {
                    pending.swap_remove(pos);
                }
                debug!("forced state reconciliation");
                poll_once(&client, &shared).await;
                ticker.reset();
            }
        }
    }
}

async fn poll_once(client: &ApiClient, shared: &Shared) {
    let runtime_id = {
        let log = shared.log.lock();
        if !log.should_poll(shared.open.load(Ordering::Acquire)) {
            return;
        }
        log.runtime_id().map(str::to_string)
    };
    let Some(runtime_id) = runtime_id else {
        return;
    };
    match client.containers().state(&runtime_id).await {
        Ok(state) => {
            client
                .cache()
                .put(QueryKey::ContainerState(runtime_id), state.clone());
            shared.update(|log| log.apply_state(&state));
        }
        Err(e) => warn!(runtime_id, error = %e, "state poll failed"),
    }
}
