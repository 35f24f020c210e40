//! Contracts for the external collaborators the supervisor depends on.
//!
//! Production implementations live in the submodules; `mock` holds
//! in-memory doubles used by the tests.

use crate::camera::CameraConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

mod memory;
pub mod mock;
mod model;
mod mysql;
mod prompt;
mod storage;

pub use memory::SystemMemory;
pub use model::ArtifactModelLoader;
pub use mysql::MySqlConnector;
pub use prompt::PromptCollector;
pub use storage::{GcsConnector, GcsStorage};

/// Gathers camera configurations from an operator
#[async_trait]
pub trait ConfigCollector: Send + Sync {
    /// An empty result means the operator aborted
    async fn collect(&self) -> Result<Vec<CameraConfig>>;
}

/// Opens sessions against the persisted configuration store
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreSession>>;
}

/// One open connection to the persisted configuration store.
///
/// Callers must finish with `disconnect`, including on error paths.
#[async_trait]
pub trait StoreSession: Send {
    async fn query_configs(&mut self) -> Result<Vec<CameraConfig>>;

    async fn execute(&mut self, statement: &str) -> Result<()>;

    async fn disconnect(self: Box<Self>);
}

/// Opens object storage clients
#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn open(&self) -> Result<Box<dyn ObjectStorage>>;
}

#[async_trait]
pub trait ObjectStorage: Send {
    async fn test_connection(&mut self) -> Result<bool>;

    /// Release any resources held by the client
    async fn stop(self: Box<Self>);
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Box<dyn InferenceModel>>;
}

pub trait InferenceModel: Send {
    fn infer(&mut self, frame: &Frame) -> Result<InferenceOutput>;
}

/// Reports available system memory
pub trait MemoryProbe: Send + Sync {
    /// `None` when the platform cannot report it
    fn available_bytes(&self) -> Option<u64>;
}

/// Raw interleaved image buffer handed to a model
#[derive(Debug, Clone)]
pub struct Frame {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Zero-filled frame of the given shape
    pub fn zeros(height: u32, width: u32, channels: u32) -> Self {
        let len = height as usize * width as usize * channels as usize;
        Self {
            height,
            width,
            channels,
            data: vec![0; len],
        }
    }

    pub fn shape(&self) -> (u32, u32, u32) {
        (self.height, self.width, self.channels)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceOutput {
    pub detections: usize,
}
