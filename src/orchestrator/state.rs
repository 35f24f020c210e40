use super::types::{OrchestratorState, WorkerFailure};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Status {
    state: OrchestratorState,
    live: Vec<String>,
    failures: Vec<WorkerFailure>,
    stop_request: CancellationToken,
}

/// Cloneable view of a running orchestrator.
///
/// Readers never block the supervising loop for longer than a field copy.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorHandle {
    status: Arc<RwLock<Status>>,
}

impl OrchestratorHandle {
    pub fn state(&self) -> OrchestratorState {
        self.status.read().state
    }

    /// Camera ids of workers that have not exited, in start order
    pub fn live_workers(&self) -> Vec<String> {
        self.status.read().live.clone()
    }

    /// Failures recorded during the current or most recent run
    pub fn failures(&self) -> Vec<WorkerFailure> {
        self.status.read().failures.clone()
    }

    /// Ask a running orchestrator to stop. Returns false when nothing is running.
    pub fn request_stop(&self) -> bool {
        let status = self.status.read();
        if status.state != OrchestratorState::Running {
            return false;
        }
        status.stop_request.cancel();
        true
    }

    pub(super) fn set_state(&self, state: OrchestratorState) {
        self.status.write().state = state;
    }

    pub(super) fn begin_run(&self, live: Vec<String>) {
        let mut status = self.status.write();
        status.live = live;
        status.failures.clear();
        status.stop_request = CancellationToken::new();
    }

    pub(super) fn stop_request(&self) -> CancellationToken {
        self.status.read().stop_request.clone()
    }

    /// Returns false if the worker had already been reaped
    pub(super) fn worker_exited(&self, camera_id: &str) -> bool {
        let mut status = self.status.write();
        let before = status.live.len();
        status.live.retain(|id| id != camera_id);
        status.live.len() != before
    }

    pub(super) fn record_failure(&self, failure: WorkerFailure) {
        self.status.write().failures.push(failure);
    }

    pub(super) fn clear_live(&self) {
        self.status.write().live.clear();
    }
}
