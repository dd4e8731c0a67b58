//! ## lookout-engine::state
//! **Worker state shared by the supervisor, the cycle and status readers**
//!
//! ### Expectations:
//! - Every field lives behind one mutex; no lock is held across an await
//! - `running == true` implies `worker` is set
//! - At most one handle in `worker`; a stopped worker that has not yet
//!   confirmed exit is parked in `retiring`

use parking_lot::Mutex;
use tokio::sync::watch;

use lookout_core::StopSignal;

/// Supervisor-side view of one launched worker.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    pub(crate) id: u64,
    pub(crate) signal: StopSignal,
    /// Closed (sender dropped) when the worker task finishes.
    pub(crate) exited: watch::Receiver<()>,
}

#[derive(Debug, Default)]
pub(crate) struct WorkerState {
    pub(crate) running: bool,
    pub(crate) worker: Option<WorkerHandle>,
    pub(crate) retiring: Option<WorkerHandle>,
    pub(crate) last_artifact: Option<String>,
}

/// Process-wide live-capture state.
#[derive(Debug, Default)]
pub struct LiveState {
    inner: Mutex<WorkerState>,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// File name of the most recently completed raw capture.
    pub fn last_artifact(&self) -> Option<String> {
        self.inner.lock().last_artifact.clone()
    }

    /// `(running, last_artifact)` read under a single lock.
    pub fn snapshot(&self) -> (bool, Option<String>) {
        let state = self.inner.lock();
        (state.running, state.last_artifact.clone())
    }

    /// Record a completed cycle's raw capture.
    pub(crate) fn commit_artifact(&self, name: String) {
        self.inner.lock().last_artifact = Some(name);
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, WorkerState> {
        self.inner.lock()
    }
}

/// Resolves once the worker owning the paired sender has finished.
pub(crate) async fn wait_exit(exited: &mut watch::Receiver<()>) {
    while exited.changed().await.is_ok() {}
}
