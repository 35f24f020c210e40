use super::state::OrchestratorHandle;
use super::types::{OrchestratorState, WorkerFailure};
use super::worker::{WorkerExit, WorkerHandle};
use crate::camera::{validate_set, CameraConfig};
use crate::capability::CapabilityRegistry;
use crate::config::OrchestratorConfig;
use crate::error::{MulticamError, Result};
use crate::events::{EventBus, SupervisorEvent};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owns the per-camera workers and drives them as a group
pub struct CameraOrchestrator {
    pub(super) grace_period: Duration,
    pub(super) halt_on_worker_failure: bool,
    pub(super) registry: Arc<CapabilityRegistry>,
    pub(super) event_bus: EventBus,

    pub(super) configs: Vec<Arc<CameraConfig>>,
    pub(super) workers: Vec<WorkerHandle>,
    pub(super) exits: Option<mpsc::UnboundedReceiver<WorkerExit>>,

    // Lifecycle management
    pub(super) handle: OrchestratorHandle,
    pub(super) run_token: CancellationToken,
    pub(super) run_id: Option<String>,
}

impl CameraOrchestrator {
    pub fn new(
        settings: &OrchestratorConfig,
        registry: Arc<CapabilityRegistry>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            grace_period: settings.grace_period(),
            halt_on_worker_failure: settings.halt_on_worker_failure,
            registry,
            event_bus,
            configs: Vec::new(),
            workers: Vec::new(),
            exits: None,
            handle: OrchestratorHandle::default(),
            run_token: CancellationToken::new(),
            run_id: None,
        }
    }

    /// Override the grace period taken from configuration
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn state(&self) -> OrchestratorState {
        self.handle.state()
    }

    pub fn handle(&self) -> OrchestratorHandle {
        self.handle.clone()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn configs(&self) -> &[Arc<CameraConfig>] {
        &self.configs
    }

    /// Load the camera set to supervise. A rejected set leaves the
    /// orchestrator exactly as it was.
    pub fn load(&mut self, configs: Vec<CameraConfig>) -> Result<()> {
        let state = self.state();
        if matches!(state, OrchestratorState::Running | OrchestratorState::Stopping) {
            return Err(MulticamError::InvalidState {
                operation: "load",
                state,
            });
        }

        validate_set(&configs)?;
        for config in &configs {
            self.registry.ensure_resolvable(config)?;
        }

        info!("Loaded {} camera configurations", configs.len());
        self.configs = configs.into_iter().map(Arc::new).collect();
        self.set_state(OrchestratorState::Loaded);
        Ok(())
    }

    pub(super) fn set_state(&self, state: OrchestratorState) {
        self.handle.set_state(state);
        debug!("Orchestrator state changed to: {:?}", state);
        self.event_bus
            .publish(SupervisorEvent::StateChanged { state });
    }

    /// Reap one worker exit; returns the failure if the worker died with an error
    pub(super) fn record_exit(&self, exit: WorkerExit) -> Option<WorkerFailure> {
        if !self.handle.worker_exited(&exit.camera_id) {
            return None;
        }

        match exit.outcome {
            Ok(()) => {
                info!("Worker for camera {} exited", exit.camera_id);
                self.event_bus.publish(SupervisorEvent::WorkerExited {
                    camera_id: exit.camera_id,
                });
                None
            }
            Err(error) => {
                let failure = WorkerFailure {
                    camera_id: exit.camera_id,
                    error,
                    at: Utc::now(),
                };
                self.handle.record_failure(failure.clone());
                self.event_bus.publish(SupervisorEvent::WorkerFailed {
                    camera_id: failure.camera_id.clone(),
                    error: failure.error.clone(),
                    timestamp: failure.at,
                });
                Some(failure)
            }
        }
    }
}

impl Drop for CameraOrchestrator {
    fn drop(&mut self) {
        // Workers observe this and wind down on their own
        self.run_token.cancel();
    }
}
