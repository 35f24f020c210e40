use super::coordinator::CameraOrchestrator;
use super::types::{OrchestratorState, StopReport};
use crate::error::{MulticamError, Result};
use crate::events::SupervisorEvent;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

impl CameraOrchestrator {
    /// Cancel every worker and wait for them against one shared grace deadline.
    ///
    /// Workers still running at the deadline are aborted and reported as
    /// abandoned. Always leaves the orchestrator `Idle`.
    pub async fn stop(&mut self) -> Result<StopReport> {
        let state = self.state();
        if state != OrchestratorState::Running {
            return Err(MulticamError::InvalidState {
                operation: "stop",
                state,
            });
        }

        self.set_state(OrchestratorState::Stopping);
        info!(
            "Stopping {} workers (grace period {:?})",
            self.workers.len(),
            self.grace_period
        );

        // One cancel reaches every worker's child token at once
        self.run_token.cancel();
        let deadline = Instant::now() + self.grace_period;

        let mut report = StopReport::default();
        for mut worker in std::mem::take(&mut self.workers) {
            match timeout_at(deadline, &mut worker.join).await {
                Ok(Ok(())) => {
                    info!("Worker for {} stopped", worker.camera_id);
                    report.acknowledged.push(worker.camera_id);
                }
                Ok(Err(e)) => {
                    error!("Worker for {} ended abnormally: {}", worker.camera_id, e);
                    report.acknowledged.push(worker.camera_id);
                }
                Err(_) => {
                    worker.join.abort();
                    warn!(
                        "Worker for {} did not stop within {:?}, forcing termination",
                        worker.camera_id, self.grace_period
                    );
                    self.event_bus.publish(SupervisorEvent::WorkerAbandoned {
                        camera_id: worker.camera_id.clone(),
                    });
                    report.abandoned.push(worker.camera_id);
                }
            }
        }

        // Failures raised while winding down still count
        if let Some(mut exits) = self.exits.take() {
            while let Ok(exit) = exits.try_recv() {
                self.record_exit(exit);
            }
        }

        self.handle.clear_live();
        self.configs.clear();
        self.set_state(OrchestratorState::Idle);

        info!(
            "Shutdown complete: {} acknowledged, {} abandoned",
            report.acknowledged.len(),
            report.abandoned.len()
        );
        Ok(report)
    }
}
