//! ## lookout-engine::supervisor
//! **Lifecycle of the single background capture worker**
//!
//! ### Expectations:
//! - `start` while running is a no-op; concurrent starts launch one worker
//! - `stop` signals, never aborts, and waits at most `stop_timeout`
//! - A worker restarted before its predecessor exits waits for it before
//!   running a cycle, so cycles never overlap
//! - Cycle failures are logged and counted, never surfaced to callers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, info_span, warn, Instrument};

use lookout_capture::PacketSource;
use lookout_core::StopSignal;
use lookout_detection::PipelineInvoker;
use lookout_telemetry::{EventLogger, MetricsRecorder};

use crate::cycle::{CaptureCycle, CycleOutcome, CycleReport};
use crate::error::{CycleError, SupervisorError};
use crate::settings::LiveSettings;
use crate::state::{wait_exit, LiveState, WorkerHandle};
use crate::status::StatusReader;

pub struct CaptureSupervisor {
    state: Arc<LiveState>,
    cycle: Arc<CaptureCycle>,
    cycle_interval: Duration,
    stop_timeout: Duration,
    metrics: Option<Arc<MetricsRecorder>>,
    launches: AtomicU64,
}

impl CaptureSupervisor {
    pub fn new(
        source: Arc<dyn PacketSource>,
        pipeline: Arc<dyn PipelineInvoker>,
        settings: LiveSettings,
    ) -> Self {
        let state = Arc::new(LiveState::new());
        let cycle_interval = settings.cycle_interval;
        let stop_timeout = settings.stop_timeout;
        let cycle = Arc::new(CaptureCycle::new(source, pipeline, settings, state.clone()));
        Self {
            state,
            cycle,
            cycle_interval,
            stop_timeout,
            metrics: None,
            launches: AtomicU64::new(0),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Launch the worker. `Ok(false)` if one is already running.
    ///
    /// Must be called from within a tokio runtime; otherwise the worker cannot
    /// be launched and an error is returned with the state left untouched.
    pub fn start(&self) -> Result<bool, SupervisorError> {
        let mut state = self.state.lock();
        if state.running {
            debug!("Start requested while already running");
            return Ok(false);
        }

        let runtime = Handle::try_current().map_err(|e| SupervisorError::Launch(e.to_string()))?;

        let id = self.launches.fetch_add(1, Ordering::SeqCst) + 1;
        let signal = StopSignal::new();
        let (exit_tx, exit_rx) = watch::channel(());
        let previous = state.retiring.take().map(|handle| handle.exited);

        let worker = Worker {
            id,
            signal: signal.clone(),
            cycle: self.cycle.clone(),
            interval: self.cycle_interval,
            metrics: self.metrics.clone(),
        };
        runtime.spawn(
            worker
                .run(previous, exit_tx)
                .instrument(info_span!("live_worker", worker = id)),
        );

        state.worker = Some(WorkerHandle {
            id,
            signal,
            exited: exit_rx,
        });
        state.running = true;
        drop(state);

        if let Some(metrics) = &self.metrics {
            metrics.set_running(true);
        }
        info!(worker = id, "Live capture started");
        Ok(true)
    }

    /// Signal the worker and wait (bounded) for it to exit. No-op when idle.
    ///
    /// Returns once the worker has exited or the stop timeout elapsed; an
    /// in-flight pipeline run may still finish and commit after a timeout.
    pub async fn stop(&self) {
        let pending = {
            let mut state = self.state.lock();
            state.running = false;
            state.worker.take().map(|handle| {
                handle.signal.trigger();
                let pending = (handle.id, handle.exited.clone());
                state.retiring = Some(handle);
                pending
            })
        };

        if let Some(metrics) = &self.metrics {
            metrics.set_running(false);
        }

        let Some((id, mut exited)) = pending else {
            debug!("Stop requested while idle");
            return;
        };

        match tokio::time::timeout(self.stop_timeout, wait_exit(&mut exited)).await {
            Ok(()) => {
                let mut state = self.state.lock();
                if state.retiring.as_ref().is_some_and(|handle| handle.id == id) {
                    state.retiring = None;
                }
                info!(worker = id, "Live capture stopped");
            }
            Err(_) => {
                warn!(
                    worker = id,
                    timeout = ?self.stop_timeout,
                    "Live worker still finishing its cycle; it will exit on its own"
                );
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn last_artifact(&self) -> Option<String> {
        self.state.last_artifact()
    }

    /// Workers launched over this supervisor's lifetime.
    pub fn launches(&self) -> u64 {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn status_reader(&self) -> StatusReader {
        StatusReader::new(self.state.clone(), self.cycle.settings().results_file.clone())
    }
}

struct Worker {
    id: u64,
    signal: StopSignal,
    cycle: Arc<CaptureCycle>,
    interval: Duration,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl Worker {
    /// Holds `_exit` for its whole life; dropping it tells waiters we are gone.
    async fn run(self, previous: Option<watch::Receiver<()>>, _exit: watch::Sender<()>) {
        if let Some(mut previous) = previous {
            debug!("Waiting for the previous worker to finish");
            tokio::select! {
                _ = wait_exit(&mut previous) => {}
                _ = self.signal.triggered() => {
                    debug!("Stopped before the first cycle");
                    return;
                }
            }
        }

        debug!("Live worker running");
        while !self.signal.is_triggered() {
            let cycle = self.cycle.clone();
            let signal = self.signal.clone();
            match spawn_blocking(move || cycle.run(&signal)).await {
                Ok(Ok(CycleOutcome::Completed(report))) => self.on_completed(&report).await,
                Ok(Ok(CycleOutcome::Skipped(reason))) => debug!(?reason, "Cycle skipped"),
                Ok(Err(e)) => self.on_failed(&e),
                Err(e) => {
                    error!("Capture cycle panicked: {e}");
                    self.record_failure();
                }
            }

            if self.signal.is_triggered() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.signal.triggered() => break,
            }
        }
        debug!("Live worker exited");
    }

    async fn on_completed(&self, report: &CycleReport) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(
                report.summary.flows as u64,
                report.summary.summary.attack,
                report.pipeline_time.as_secs_f64(),
            );
        }
        for (event_type, metadata) in cycle_events(report) {
            EventLogger::log_event(event_type, metadata).await;
        }
    }

    fn on_failed(&self, e: &CycleError) {
        match e {
            CycleError::Capture(_) => warn!("Capture cycle produced nothing: {e}"),
            _ => error!("Capture cycle failed: {e}"),
        }
        self.record_failure();
    }

    fn record_failure(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_failure();
        }
    }
}

/// Security events for one committed cycle: always `cycle_committed`, plus
/// `attack_flows_detected` when any row was an attack.
fn cycle_events(report: &CycleReport) -> Vec<(&'static str, Vec<KeyValue>)> {
    let metadata = vec![
        KeyValue::new("artifact", report.artifact.clone()),
        KeyValue::new("flows", report.summary.flows as i64),
        KeyValue::new("attack_flows", report.summary.summary.attack as i64),
    ];

    let mut events = vec![("cycle_committed", metadata.clone())];
    if report.summary.summary.attack > 0 {
        events.push(("attack_flows_detected", metadata));
    }
    events
}
