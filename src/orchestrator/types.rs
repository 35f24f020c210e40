use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Orchestrator lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    /// No configurations loaded
    #[default]
    Idle,
    /// Configurations present, no workers running
    Loaded,
    Running,
    Stopping,
}

/// Why a supervised run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopReason {
    DeadlineElapsed,
    StopRequested,
    Signal(String),
    /// Camera id of the worker whose failure halted the run
    WorkerFailure(String),
    AllWorkersExited,
}

/// A worker pipeline that terminated with an error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerFailure {
    pub camera_id: String,
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Outcome of a stop: which workers acknowledged cancellation in time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StopReport {
    pub acknowledged: Vec<String>,
    pub abandoned: Vec<String>,
}

impl StopReport {
    pub fn is_clean(&self) -> bool {
        self.abandoned.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub reason: StopReason,
    pub elapsed: Duration,
    pub failures: Vec<WorkerFailure>,
    pub stop: StopReport,
}
