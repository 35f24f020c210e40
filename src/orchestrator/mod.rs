//! Supervision of per-camera workers

mod coordinator;
mod runtime;
mod shutdown;
mod state;
mod types;
pub mod worker;


/// Held shared by test runs that listen for process signals, and exclusively
/// by tests that raise one.
#[cfg(test)]
pub(crate) static SIGNAL_LISTENERS: tokio::sync::RwLock<()> = tokio::sync::RwLock::const_new(());

pub use coordinator::CameraOrchestrator;
pub use state::OrchestratorHandle;
pub use types::{OrchestratorState, RunSummary, StopReason, StopReport, WorkerFailure};
pub use worker::WorkerHandle;
