use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Process-wide settings, built once at startup and shared by reference.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MulticamConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub preflight: PreflightConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Schema holding the camera configuration tables
    #[serde(default = "default_db_name")]
    pub database: String,

    /// Connection attempt timeout in seconds
    #[serde(default = "default_db_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Service account credentials file
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Base URL of the storage API
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_storage_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    /// Object detection weights, also used by the diagnostics inference probe
    #[serde(default = "default_detection_model")]
    pub detection: PathBuf,

    #[serde(default = "default_ppe_model")]
    pub ppe_detection: PathBuf,

    #[serde(default = "default_pose_model")]
    pub pose_estimation: PathBuf,

    /// Expected model input as (height, width, channels)
    #[serde(default = "default_input_shape")]
    pub input_shape: (u32, u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreflightConfig {
    /// Below this much available memory the memory check is advisory
    #[serde(default = "default_min_memory_gb")]
    pub min_available_memory_gb: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OrchestratorConfig {
    /// How long stop() waits for workers before abandoning them
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: u64,

    /// Stop the whole run when any worker fails
    #[serde(default)]
    pub halt_on_worker_failure: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PipelineConfig {
    /// Interval between stream reachability probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Consecutive unreachable probes before a pipeline gives up
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathConfig {
    #[serde(default = "default_camera_file")]
    pub camera_file: PathBuf,

    #[serde(default = "default_schema_file")]
    pub schema_file: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl MulticamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("multicam.toml")
    }

    /// Load configuration from a specific file path.
    ///
    /// Missing files fall back to defaults. Environment variables such as
    /// `MULTICAM_DATABASE__HOST` override file values.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("MULTICAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: MulticamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.host.trim().is_empty() {
            return Err(ConfigError::Message(
                "Database host must not be empty".to_string(),
            ));
        }

        if self.database.connect_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Database connect_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        let (height, width, channels) = self.models.input_shape;
        if height == 0 || width == 0 || channels == 0 {
            return Err(ConfigError::Message(
                "Model input_shape dimensions must be greater than 0".to_string(),
            ));
        }

        if !(self.preflight.min_available_memory_gb > 0.0) {
            return Err(ConfigError::Message(
                "Preflight min_available_memory_gb must be greater than 0".to_string(),
            ));
        }

        if self.orchestrator.grace_period_seconds == 0 {
            return Err(ConfigError::Message(
                "Orchestrator grace_period_seconds must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.probe_interval_ms == 0 || self.pipeline.probe_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Pipeline probe interval and timeout must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_consecutive_failures == 0 {
            return Err(ConfigError::Message(
                "Pipeline max_consecutive_failures must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Every model artifact the preflight check requires
    pub fn required_models(&self) -> Vec<&Path> {
        vec![
            self.models.detection.as_path(),
            self.models.ppe_detection.as_path(),
            self.models.pose_estimation.as_path(),
        ]
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl OrchestratorConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_seconds)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            database: default_db_name(),
            connect_timeout_seconds: default_db_connect_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            bucket_name: default_bucket_name(),
            project_id: default_project_id(),
            endpoint: default_storage_endpoint(),
            timeout_seconds: default_storage_timeout(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            detection: default_detection_model(),
            ppe_detection: default_ppe_model(),
            pose_estimation: default_pose_model(),
            input_shape: default_input_shape(),
        }
    }
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            min_available_memory_gb: default_min_memory_gb(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            grace_period_seconds: default_grace_period(),
            halt_on_worker_failure: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: default_probe_interval(),
            probe_timeout_ms: default_probe_timeout(),
            max_consecutive_failures: default_max_failures(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            camera_file: default_camera_file(),
            schema_file: default_schema_file(),
            log_dir: default_log_dir(),
        }
    }
}

// Default value functions
fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    3306
}
fn default_db_user() -> String {
    "root".to_string()
}
fn default_db_name() -> String {
    "multi_camera_monitoring".to_string()
}
fn default_db_connect_timeout() -> u64 {
    5
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials/gcp-service-account.json")
}
fn default_bucket_name() -> String {
    "multicam-events".to_string()
}
fn default_project_id() -> String {
    "multicam".to_string()
}
fn default_storage_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}
fn default_storage_timeout() -> u64 {
    10
}

fn default_detection_model() -> PathBuf {
    PathBuf::from("models/yolov8n.pt")
}
fn default_ppe_model() -> PathBuf {
    PathBuf::from("models/ppe_detection.pt")
}
fn default_pose_model() -> PathBuf {
    PathBuf::from("models/yolov8n-pose.pt")
}
fn default_input_shape() -> (u32, u32, u32) {
    (480, 640, 3)
}

fn default_min_memory_gb() -> f64 {
    2.0
}

fn default_grace_period() -> u64 {
    10
}

fn default_probe_interval() -> u64 {
    5000
}
fn default_probe_timeout() -> u64 {
    3000
}
fn default_max_failures() -> u32 {
    3
}

fn default_camera_file() -> PathBuf {
    PathBuf::from("config/camera_configurations.json")
}
fn default_schema_file() -> PathBuf {
    PathBuf::from("config/multi_camera_database_setup.sql")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
