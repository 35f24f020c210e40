//! In-memory doubles for the external service contracts

use super::{
    ConfigCollector, Frame, InferenceModel, InferenceOutput, MemoryProbe, ModelLoader,
    ObjectStorage, StorageConnector, StoreConnector, StoreSession,
};
use crate::camera::CameraConfig;
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Configuration store double that records every statement it runs
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    unreachable: bool,
    configs: Vec<CameraConfig>,
    failing_marker: Option<String>,
    executed: Arc<Mutex<Vec<String>>>,
    connects: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_configs(mut self, configs: Vec<CameraConfig>) -> Self {
        self.configs = configs;
        self
    }

    /// Statements containing `marker` fail with the given error text
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.failing_marker = Some(marker.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for MockStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>> {
        if self.unreachable {
            return Err(MulticamError::unavailable("database", "connection refused"));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl StoreSession for MockStore {
    async fn query_configs(&mut self) -> Result<Vec<CameraConfig>> {
        Ok(self.configs.clone())
    }

    async fn execute(&mut self, statement: &str) -> Result<()> {
        if let Some(marker) = &self.failing_marker {
            if statement.contains(marker.as_str()) {
                return Err(MulticamError::component(
                    "database".to_string(),
                    format!("You have an error in your SQL syntax near '{}'", marker),
                ));
            }
        }
        self.executed.lock().push(statement.to_string());
        Ok(())
    }

    async fn disconnect(self: Box<Self>) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Object storage double
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    unreachable: bool,
    stops: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageConnector for MockStorage {
    async fn open(&self) -> Result<Box<dyn ObjectStorage>> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn test_connection(&mut self) -> Result<bool> {
        Ok(!self.unreachable)
    }

    async fn stop(self: Box<Self>) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Model loader double producing models that accept any frame
#[derive(Debug, Clone, Default)]
pub struct MockModelLoader {
    broken: bool,
}

impl MockModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self { broken: true }
    }
}

#[async_trait]
impl ModelLoader for MockModelLoader {
    async fn load(&self, path: &Path) -> Result<Box<dyn InferenceModel>> {
        if self.broken {
            return Err(MulticamError::Inference(format!(
                "cannot load {}",
                path.display()
            )));
        }
        Ok(Box::new(MockModel))
    }
}

struct MockModel;

impl InferenceModel for MockModel {
    fn infer(&mut self, _frame: &Frame) -> Result<InferenceOutput> {
        Ok(InferenceOutput::default())
    }
}

/// Collector double returning a fixed list
#[derive(Debug, Clone, Default)]
pub struct MockCollector {
    configs: Vec<CameraConfig>,
}

impl MockCollector {
    pub fn new(configs: Vec<CameraConfig>) -> Self {
        Self { configs }
    }
}

#[async_trait]
impl ConfigCollector for MockCollector {
    async fn collect(&self) -> Result<Vec<CameraConfig>> {
        Ok(self.configs.clone())
    }
}

/// Memory probe reporting a fixed value
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub Option<u64>);

impl FixedMemory {
    pub fn gigabytes(gb: f64) -> Self {
        Self(Some((gb * 1024.0 * 1024.0 * 1024.0) as u64))
    }
}

impl MemoryProbe for FixedMemory {
    fn available_bytes(&self) -> Option<u64> {
        self.0
    }
}
