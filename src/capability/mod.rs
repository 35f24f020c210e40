//! Static registry mapping capability tags to pipeline factories

use crate::camera::CameraConfig;
use crate::config::PipelineConfig;
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod watchdog;
#[cfg(test)]
mod tests;

pub use watchdog::StreamWatchdog;

/// Capability tags shipped with the supervisor
pub const BUILTIN_CAPABILITIES: [&str; 5] = [
    "people_counting",
    "ppe_detection",
    "tailgating_zone",
    "intrusion_zone",
    "loitering_zone",
];

/// One capability's processing loop for one camera.
///
/// Implementations must check `cancel` between processing units and return
/// promptly once it fires. Returning `Err` marks the worker as failed.
#[async_trait]
pub trait Pipeline: Send {
    async fn run(self: Box<Self>, camera: Arc<CameraConfig>, cancel: CancellationToken)
        -> Result<()>;
}

pub type PipelineFactory = Arc<dyn Fn() -> Box<dyn Pipeline> + Send + Sync>;

/// Capability tag -> pipeline factory, populated at startup
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    factories: HashMap<String, PipelineFactory>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in capability backed by a stream watchdog
    pub fn with_builtin(settings: &PipelineConfig) -> Self {
        let mut registry = Self::new();
        for tag in BUILTIN_CAPABILITIES {
            let settings = settings.clone();
            registry.register(tag, move || {
                Box::new(StreamWatchdog::from_config(tag, &settings)) as Box<dyn Pipeline>
            });
        }
        registry
    }

    /// Register or replace the factory for `tag`
    pub fn register<F>(&mut self, tag: &str, factory: F)
    where
        F: Fn() -> Box<dyn Pipeline> + Send + Sync + 'static,
    {
        self.factories.insert(tag.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Build a fresh pipeline for `tag`
    pub fn resolve(&self, tag: &str) -> Result<Box<dyn Pipeline>> {
        self.factories
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| MulticamError::UnknownCapability(tag.to_string()))
    }

    /// Check that every capability a camera needs is registered
    pub fn ensure_resolvable(&self, camera: &CameraConfig) -> Result<()> {
        match camera
            .active_use_cases()
            .into_iter()
            .find(|tag| !self.contains(tag))
        {
            Some(tag) => Err(MulticamError::UnknownCapability(format!(
                "{} (camera {})",
                tag, camera.camera_id
            ))),
            None => Ok(()),
        }
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
