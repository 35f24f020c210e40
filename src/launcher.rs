//! Command dispatch shared by the binary and the tests

use crate::camera::{log_summary, ConfigSource, SourceKind};
use crate::capability::CapabilityRegistry;
use crate::config::MulticamConfig;
use crate::diagnostics::{summarize, DiagnosticsRunner};
use crate::error::{MulticamError, Result};
use crate::events::EventBus;
use crate::orchestrator::CameraOrchestrator;
use crate::preflight::PreflightValidator;
use crate::schema::SchemaInitializer;
use crate::services::{
    ArtifactModelLoader, ConfigCollector, GcsConnector, MemoryProbe, ModelLoader, MySqlConnector,
    PromptCollector, StorageConnector, StoreConnector, SystemMemory,
};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Every external collaborator the commands need
#[derive(Clone)]
pub struct Services {
    pub collector: Arc<dyn ConfigCollector>,
    pub store: Arc<dyn StoreConnector>,
    pub storage: Arc<dyn StorageConnector>,
    pub models: Arc<dyn ModelLoader>,
    pub memory: Arc<dyn MemoryProbe>,
    pub registry: Arc<CapabilityRegistry>,
}

impl Services {
    /// Wire the production implementations from configuration
    pub fn production(config: &MulticamConfig) -> Self {
        Self {
            collector: Arc::new(PromptCollector::new()),
            store: Arc::new(MySqlConnector::new(config.database.clone())),
            storage: Arc::new(GcsConnector::new(config.storage.clone())),
            models: Arc::new(ArtifactModelLoader::new(config.models.input_shape)),
            memory: Arc::new(SystemMemory),
            registry: Arc::new(CapabilityRegistry::with_builtin(&config.pipeline)),
        }
    }
}

pub struct Launcher {
    config: Arc<MulticamConfig>,
    services: Services,
    event_bus: EventBus,
}

impl Launcher {
    pub fn new(config: Arc<MulticamConfig>, services: Services) -> Self {
        Self {
            config,
            services,
            event_bus: EventBus::default(),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn banner(&self) {
        info!("Multi-camera monitoring system v{}", env!("CARGO_PKG_VERSION"));
        info!("Started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        info!(
            "Database: {}@{}:{}/{}",
            self.config.database.user,
            self.config.database.host,
            self.config.database.port,
            self.config.database.database
        );
        info!("Storage bucket: {}", self.config.storage.bucket_name);
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::new(
            Arc::clone(&self.config),
            Arc::clone(&self.services.collector),
            Arc::clone(&self.services.store),
        )
    }

    async fn preflight(&self) -> Result<()> {
        PreflightValidator::new(
            Arc::clone(&self.config),
            Arc::clone(&self.services.store),
            Arc::clone(&self.services.memory),
        )
        .validate()
        .await
        .into_result()
        .map(|_| ())
    }

    /// Validate, load cameras from `source` and supervise them until the run ends
    pub async fn run(&self, source: SourceKind, run_time: Option<Duration>) -> Result<i32> {
        if let Err(e) = self.preflight().await {
            error!("{}", e);
            eprintln!("✗ System validation failed. Please fix issues before continuing.");
            return Ok(EXIT_FAILURE);
        }

        let configs = match self.source().load(source).await {
            Ok(configs) if configs.is_empty() => {
                error!("{}", MulticamError::NoConfigurations);
                return Ok(EXIT_FAILURE);
            }
            Ok(configs) => configs,
            Err(e) => {
                error!("Failed to load camera configurations: {}", e);
                return Ok(EXIT_FAILURE);
            }
        };
        log_summary(&configs);

        let mut orchestrator = CameraOrchestrator::new(
            &self.config.orchestrator,
            Arc::clone(&self.services.registry),
            self.event_bus.clone(),
        );
        orchestrator.load(configs)?;

        match run_time {
            Some(limit) => info!("Running for {} seconds", limit.as_secs_f64()),
            None => info!("Running continuously (Ctrl+C to stop)"),
        }

        let summary = orchestrator.start(run_time).await?;
        for failure in &summary.failures {
            warn!(
                "Camera {} failed at {}: {}",
                failure.camera_id, failure.at, failure.error
            );
        }
        if !summary.stop.is_clean() {
            warn!(
                "Workers abandoned at shutdown: {}",
                summary.stop.abandoned.join(", ")
            );
        }

        info!("Multi-camera system stopped ({:?})", summary.reason);
        Ok(EXIT_SUCCESS)
    }

    /// Collect cameras from the operator and save them for `--source file`
    pub async fn configure(&self) -> Result<i32> {
        let source = self.source();
        let configs = source.load(SourceKind::Interactive).await?;
        if configs.is_empty() {
            warn!("Configuration aborted, nothing saved");
            return Ok(EXIT_FAILURE);
        }

        log_summary(&configs);
        source.save_to_file(&configs).await?;
        Ok(EXIT_SUCCESS)
    }

    pub async fn diagnostics(&self) -> i32 {
        let runner = DiagnosticsRunner::new(
            Arc::clone(&self.config),
            Arc::clone(&self.services.store),
            Arc::clone(&self.services.storage),
            Arc::clone(&self.services.models),
            Arc::clone(&self.services.registry),
        );
        let results = runner.run().await;

        if summarize(&results).all_passed() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }

    pub async fn init_db(&self, schema: Option<&Path>) -> i32 {
        let path = schema.unwrap_or(self.config.paths.schema_file.as_path());
        match SchemaInitializer::new(Arc::clone(&self.services.store))
            .initialize(path)
            .await
        {
            Ok(report) => {
                if report.rejected() > 0 {
                    warn!(
                        "{} schema statements were rejected, review the log above",
                        report.rejected()
                    );
                }
                EXIT_SUCCESS
            }
            Err(e) => {
                error!("Database schema initialization failed: {}", e);
                EXIT_FAILURE
            }
        }
    }

    pub async fn validate_only(&self) -> i32 {
        match self.preflight().await {
            Ok(()) => {
                println!("✓ System validation completed - system is ready");
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                EXIT_FAILURE
            }
        }
    }
}
