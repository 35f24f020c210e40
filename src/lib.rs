pub mod camera;
pub mod capability;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod launcher;
pub mod orchestrator;
pub mod preflight;
pub mod schema;
pub mod services;

pub use camera::{CameraConfig, ConfigSource, SourceKind, StreamLocator};
pub use capability::{CapabilityRegistry, Pipeline, StreamWatchdog};
pub use config::MulticamConfig;
pub use diagnostics::{DiagnosticsRunner, Probe, ProbeResult, ProbeStatus};
pub use error::{MulticamError, Result};
pub use events::{EventBus, SupervisorEvent};
pub use launcher::{Launcher, Services};
pub use orchestrator::{
    CameraOrchestrator, OrchestratorHandle, OrchestratorState, RunSummary, StopReason,
    StopReport, WorkerFailure,
};
pub use preflight::{PreflightValidator, ValidationReport};
pub use schema::{SchemaInitializer, SchemaReport};
