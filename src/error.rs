use crate::orchestrator::OrchestratorState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MulticamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration source or external dependency could not be reached
    #[error("{resource} unavailable: {message}")]
    SourceUnavailable { resource: String, message: String },

    /// Structurally invalid configuration input
    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    #[error("Duplicate camera id: {0}")]
    DuplicateCameraId(String),

    #[error("No camera configurations provided")]
    NoConfigurations,

    #[error("Cannot {operation} while orchestrator is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: OrchestratorState,
    },

    /// One or more fatal preflight findings
    #[error("Preflight validation failed: {0}")]
    PreconditionFailed(String),

    #[error("Worker for camera {camera_id} failed: {message}")]
    WorkerFailure { camera_id: String, message: String },

    #[error("Schema statement {index} failed: {message}")]
    PartialSchemaFailure { index: usize, message: String },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl MulticamError {
    pub fn unavailable<R: Into<String>, M: Into<String>>(resource: R, message: M) -> Self {
        Self::SourceUnavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn worker<C: Into<String>, M: Into<String>>(camera_id: C, message: M) -> Self {
        Self::WorkerFailure {
            camera_id: camera_id.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MulticamError>;
