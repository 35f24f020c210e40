use super::types::{validate_set, CameraConfig};
use crate::config::MulticamConfig;
use crate::error::{MulticamError, Result};
use crate::services::{ConfigCollector, StoreConnector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where camera configurations are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Interactive,
    Database,
    File,
    Default,
}

/// Produces the ordered camera configuration set for a run
pub struct ConfigSource {
    config: Arc<MulticamConfig>,
    collector: Arc<dyn ConfigCollector>,
    store: Arc<dyn StoreConnector>,
}

impl ConfigSource {
    pub fn new(
        config: Arc<MulticamConfig>,
        collector: Arc<dyn ConfigCollector>,
        store: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            config,
            collector,
            store,
        }
    }

    /// Load configurations from `kind`.
    ///
    /// An empty vector is not an error: the operator aborted or the store
    /// holds no rows. Non-empty results are guaranteed duplicate-free and
    /// individually valid.
    pub async fn load(&self, kind: SourceKind) -> Result<Vec<CameraConfig>> {
        let configs = match kind {
            SourceKind::Interactive => {
                info!("Loading camera configurations interactively");
                self.collector.collect().await?
            }
            SourceKind::Database => {
                info!("Loading camera configurations from database");
                self.load_from_store().await?
            }
            SourceKind::File => {
                info!(
                    "Loading camera configurations from {}",
                    self.config.paths.camera_file.display()
                );
                load_from_file(&self.config.paths.camera_file).await?
            }
            SourceKind::Default => {
                info!("Using default camera configurations");
                default_cameras()
            }
        };

        if configs.is_empty() {
            warn!("Configuration source {:?} returned no cameras", kind);
            return Ok(configs);
        }

        validate_set(&configs)?;
        info!("Loaded {} camera configurations", configs.len());
        Ok(configs)
    }

    async fn load_from_store(&self) -> Result<Vec<CameraConfig>> {
        let mut session = self.store.connect().await.map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

        let result = session.query_configs().await;
        session.disconnect().await;

        result.map_err(|e| match e {
            MulticamError::MalformedConfig(_) | MulticamError::SourceUnavailable { .. } => e,
            other => MulticamError::unavailable("database", other.to_string()),
        })
    }

    /// Persist a configuration set where `SourceKind::File` will find it
    pub async fn save_to_file(&self, configs: &[CameraConfig]) -> Result<()> {
        let path = &self.config.paths.camera_file;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let rendered = serde_json::to_string_pretty(configs)?;
        tokio::fs::write(path, rendered).await?;
        info!("Saved {} camera configurations to {}", configs.len(), path.display());
        Ok(())
    }
}

/// Parse a JSON array of camera configurations
pub async fn load_from_file(path: &Path) -> Result<Vec<CameraConfig>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MulticamError::unavailable(
                "configuration file",
                format!("{} not found", path.display()),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&raw).map_err(|e| {
        MulticamError::MalformedConfig(format!("{}: {}", path.display(), e))
    })
}

/// Built-in minimal camera set
pub fn default_cameras() -> Vec<CameraConfig> {
    vec![
        CameraConfig::new(
            "camera_001",
            "Main Entrance",
            "rtsp://192.168.1.100:554/stream1",
            "people_counting",
        ),
        CameraConfig::new(
            "camera_002",
            "Work Floor",
            "rtsp://192.168.1.101:554/stream1",
            "ppe_detection",
        ),
    ]
}

/// Log the configuration summary shown before a run starts
pub fn log_summary(configs: &[CameraConfig]) {
    info!("Camera configuration summary:");
    for config in configs {
        let active: Vec<String> = config
            .active_use_cases()
            .into_iter()
            .map(CameraConfig::display_use_case)
            .collect();

        if config.available_use_cases.is_empty() {
            info!(
                "  {}: {} [{}] via {}",
                config.camera_id,
                config.name,
                active.join(", "),
                config.stream_url
            );
        } else {
            info!(
                "  {}: {} - {}/{} models enabled ({}) via {}",
                config.camera_id,
                config.name,
                config.enabled_use_cases.len(),
                config.available_use_cases.len(),
                active.join(", "),
                config.stream_url
            );
        }
    }
}
