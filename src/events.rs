use crate::orchestrator::{OrchestratorState, StopReason};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Events reported by the supervisor while workers run
#[derive(Debug, Clone, Serialize)]
pub enum SupervisorEvent {
    /// Orchestrator moved to a new lifecycle state
    StateChanged { state: OrchestratorState },
    /// A worker was spawned for a camera
    WorkerStarted { camera_id: String },
    /// A worker's pipeline terminated with an error
    WorkerFailed {
        camera_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// A worker finished without error
    WorkerExited { camera_id: String },
    /// A worker ignored cancellation past the grace period
    WorkerAbandoned { camera_id: String },
    /// Shutdown was initiated
    ShutdownRequested { reason: StopReason },
}

impl SupervisorEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SupervisorEvent::StateChanged { state } => format!("State changed to {:?}", state),
            SupervisorEvent::WorkerStarted { camera_id } => {
                format!("Worker started for {}", camera_id)
            }
            SupervisorEvent::WorkerFailed {
                camera_id, error, ..
            } => format!("Worker for {} failed: {}", camera_id, error),
            SupervisorEvent::WorkerExited { camera_id } => {
                format!("Worker for {} exited", camera_id)
            }
            SupervisorEvent::WorkerAbandoned { camera_id } => {
                format!("Worker for {} abandoned", camera_id)
            }
            SupervisorEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {:?}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SupervisorEvent::StateChanged { .. } => "state_changed",
            SupervisorEvent::WorkerStarted { .. } => "worker_started",
            SupervisorEvent::WorkerFailed { .. } => "worker_failed",
            SupervisorEvent::WorkerExited { .. } => "worker_exited",
            SupervisorEvent::WorkerAbandoned { .. } => "worker_abandoned",
            SupervisorEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Broadcast channel carrying supervisor events to any number of listeners
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SupervisorEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers, returning how many received it
    pub fn publish(&self, event: SupervisorEvent) -> usize {
        match &event {
            SupervisorEvent::WorkerFailed {
                camera_id, error, ..
            } => {
                error!("Worker for camera {} failed: {}", camera_id, error);
            }
            SupervisorEvent::WorkerAbandoned { camera_id } => {
                warn!("Worker for camera {} forcibly terminated", camera_id);
            }
            SupervisorEvent::ShutdownRequested { reason } => {
                info!("Shutdown requested: {:?}", reason);
            }
            _ => debug!("Event: {}", event.description()),
        }

        // No subscribers is not an error for the supervisor
        self.sender.send(event).unwrap_or(0)
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
