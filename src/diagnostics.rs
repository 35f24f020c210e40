//! Live health probes against every external dependency

use crate::capability::{CapabilityRegistry, BUILTIN_CAPABILITIES};
use crate::config::MulticamConfig;
use crate::services::{Frame, ModelLoader, StorageConnector, StoreConnector};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    Database,
    ObjectStorage,
    InferenceModel,
    Capabilities,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Database => "database connection",
            Probe::ObjectStorage => "object storage",
            Probe::InferenceModel => "inference model",
            Probe::Capabilities => "capability modules",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProbeStatus {
    Pass,
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub probe: Probe,
    pub status: ProbeStatus,
    pub detail: Option<String>,
}

impl ProbeResult {
    fn pass(probe: Probe, detail: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Pass,
            detail: Some(detail.into()),
        }
    }

    fn fail(probe: Probe, reason: impl Into<String>) -> Self {
        Self {
            probe,
            status: ProbeStatus::Fail(reason.into()),
            detail: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ProbeStatus::Pass
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSummary {
    pub passed: usize,
    pub failed: usize,
}

impl DiagnosticsSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Count and log probe outcomes
pub fn summarize(results: &[ProbeResult]) -> DiagnosticsSummary {
    for result in results {
        match &result.status {
            ProbeStatus::Pass => info!(
                "✓ {}: {}",
                result.probe,
                result.detail.as_deref().unwrap_or("ok")
            ),
            ProbeStatus::Fail(reason) => error!("✗ {}: {}", result.probe, reason),
        }
    }

    let passed = results.iter().filter(|r| r.passed()).count();
    let summary = DiagnosticsSummary {
        passed,
        failed: results.len() - passed,
    };
    info!(
        "System diagnostics completed: {} passed, {} failed",
        summary.passed, summary.failed
    );
    summary
}

pub struct DiagnosticsRunner {
    config: Arc<MulticamConfig>,
    store: Arc<dyn StoreConnector>,
    storage: Arc<dyn StorageConnector>,
    models: Arc<dyn ModelLoader>,
    registry: Arc<CapabilityRegistry>,
}

impl DiagnosticsRunner {
    pub fn new(
        config: Arc<MulticamConfig>,
        store: Arc<dyn StoreConnector>,
        storage: Arc<dyn StorageConnector>,
        models: Arc<dyn ModelLoader>,
        registry: Arc<CapabilityRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            storage,
            models,
            registry,
        }
    }

    /// Run all probes in order; a failing probe never skips the ones after it
    pub async fn run(&self) -> Vec<ProbeResult> {
        info!("Running system diagnostics");
        vec![
            self.probe_database().await,
            self.probe_storage().await,
            self.probe_model().await,
            self.probe_capabilities(),
        ]
    }

    async fn probe_database(&self) -> ProbeResult {
        let limit = self.config.database.connect_timeout();
        let mut session = match timeout(limit, self.store.connect()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return ProbeResult::fail(Probe::Database, e.to_string()),
            Err(_) => {
                return ProbeResult::fail(
                    Probe::Database,
                    format!("no connection within {:?}", limit),
                )
            }
        };

        let outcome = session.query_configs().await;
        session.disconnect().await;

        match outcome {
            Ok(configs) => ProbeResult::pass(
                Probe::Database,
                format!("found {} camera configurations", configs.len()),
            ),
            Err(e) => ProbeResult::fail(Probe::Database, format!("query failed: {}", e)),
        }
    }

    async fn probe_storage(&self) -> ProbeResult {
        let mut client = match self.storage.open().await {
            Ok(client) => client,
            Err(e) => return ProbeResult::fail(Probe::ObjectStorage, e.to_string()),
        };

        let outcome = client.test_connection().await;
        client.stop().await;

        match outcome {
            Ok(true) => ProbeResult::pass(
                Probe::ObjectStorage,
                format!("bucket {} reachable", self.config.storage.bucket_name),
            ),
            Ok(false) => ProbeResult::fail(
                Probe::ObjectStorage,
                format!("bucket {} not reachable", self.config.storage.bucket_name),
            ),
            Err(e) => ProbeResult::fail(Probe::ObjectStorage, e.to_string()),
        }
    }

    async fn probe_model(&self) -> ProbeResult {
        let path = &self.config.models.detection;
        let mut model = match self.models.load(path).await {
            Ok(model) => model,
            Err(e) => return ProbeResult::fail(Probe::InferenceModel, e.to_string()),
        };

        let (height, width, channels) = self.config.models.input_shape;
        let frame = Frame::zeros(height, width, channels);
        match model.infer(&frame) {
            Ok(_) => ProbeResult::pass(
                Probe::InferenceModel,
                format!(
                    "{} loaded, test inference on {}x{}x{} ok",
                    path.display(),
                    height,
                    width,
                    channels
                ),
            ),
            Err(e) => ProbeResult::fail(
                Probe::InferenceModel,
                format!("test inference failed: {}", e),
            ),
        }
    }

    fn probe_capabilities(&self) -> ProbeResult {
        let missing: Vec<&str> = BUILTIN_CAPABILITIES
            .iter()
            .copied()
            .filter(|tag| self.registry.resolve(tag).is_err())
            .collect();

        if missing.is_empty() {
            ProbeResult::pass(
                Probe::Capabilities,
                format!("{} capabilities resolvable", BUILTIN_CAPABILITIES.len()),
            )
        } else {
            ProbeResult::fail(
                Probe::Capabilities,
                format!("unresolvable capabilities: {}", missing.join(", ")),
            )
        }
    }
}
