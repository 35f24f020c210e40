//! Exhaustive environment checks run before any worker starts

use crate::config::MulticamConfig;
use crate::error::{MulticamError, Result};
use crate::services::{MemoryProbe, StoreConnector};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{error, info, warn};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// What a finding was checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    ModelArtifacts,
    Credentials,
    Database,
    Memory,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::ModelArtifacts => "model artifacts",
            Check::Credentials => "storage credentials",
            Check::Database => "database",
            Check::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum FindingStatus {
    Ok(String),
    /// Blocks system start
    Fatal(String),
    /// Reported, never blocks
    Advisory(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub check: Check,
    pub status: FindingStatus,
}

impl Finding {
    fn ok(check: Check, detail: impl Into<String>) -> Self {
        Self {
            check,
            status: FindingStatus::Ok(detail.into()),
        }
    }

    fn fatal(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            status: FindingStatus::Fatal(message.into()),
        }
    }

    fn advisory(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            status: FindingStatus::Advisory(message.into()),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.status, FindingStatus::Fatal(_))
    }

    pub fn is_advisory(&self) -> bool {
        matches!(self.status, FindingStatus::Advisory(_))
    }
}

/// Ordered findings of one validation run
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// True iff nothing fatal was found
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_fatal)
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_fatal())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_advisory())
    }

    /// Convert a failed report into the error that blocks start
    pub fn into_result(self) -> Result<Self> {
        if self.passed() {
            return Ok(self);
        }
        let message = self
            .fatal()
            .map(|finding| match &finding.status {
                FindingStatus::Fatal(message) => format!("{}: {}", finding.check, message),
                _ => String::new(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(MulticamError::PreconditionFailed(message))
    }
}

pub struct PreflightValidator {
    config: Arc<MulticamConfig>,
    store: Arc<dyn StoreConnector>,
    memory: Arc<dyn MemoryProbe>,
}

impl PreflightValidator {
    pub fn new(
        config: Arc<MulticamConfig>,
        store: Arc<dyn StoreConnector>,
        memory: Arc<dyn MemoryProbe>,
    ) -> Self {
        Self {
            config,
            store,
            memory,
        }
    }

    /// Run every check in order. No check is skipped because an earlier one failed.
    pub async fn validate(&self) -> ValidationReport {
        info!("Validating system requirements");

        let findings = vec![
            self.check_models(),
            self.check_credentials(),
            self.check_database().await,
            self.check_memory(),
        ];

        for finding in &findings {
            match &finding.status {
                FindingStatus::Ok(detail) => info!("✓ {}: {}", finding.check, detail),
                FindingStatus::Fatal(message) => error!("✗ {}: {}", finding.check, message),
                FindingStatus::Advisory(message) => warn!("! {}: {}", finding.check, message),
            }
        }

        let report = ValidationReport { findings };
        if report.passed() {
            info!(
                "System validation passed with {} warnings",
                report.advisories().count()
            );
        } else {
            error!(
                "System validation failed with {} fatal findings",
                report.fatal().count()
            );
        }
        report
    }

    fn check_models(&self) -> Finding {
        let models = self.config.required_models();
        let missing: Vec<String> = models
            .iter()
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect();

        if missing.is_empty() {
            Finding::ok(
                Check::ModelArtifacts,
                format!("{} model files present", models.len()),
            )
        } else {
            Finding::fatal(
                Check::ModelArtifacts,
                format!("missing model files: {}", missing.join(", ")),
            )
        }
    }

    fn check_credentials(&self) -> Finding {
        let path = &self.config.storage.credentials_path;
        if path.is_file() {
            Finding::ok(Check::Credentials, format!("found {}", path.display()))
        } else {
            Finding::fatal(
                Check::Credentials,
                format!("credentials file not found: {}", path.display()),
            )
        }
    }

    async fn check_database(&self) -> Finding {
        let limit = self.config.database.connect_timeout();
        match timeout(limit, self.store.connect()).await {
            Ok(Ok(session)) => {
                session.disconnect().await;
                Finding::ok(
                    Check::Database,
                    format!(
                        "connected to {}:{}",
                        self.config.database.host, self.config.database.port
                    ),
                )
            }
            Ok(Err(e)) => Finding::fatal(Check::Database, format!("connection failed: {}", e)),
            Err(_) => Finding::fatal(
                Check::Database,
                format!("no connection within {:?}", limit),
            ),
        }
    }

    fn check_memory(&self) -> Finding {
        let minimum = self.config.preflight.min_available_memory_gb;
        match self.memory.available_bytes() {
            Some(bytes) => {
                let available = bytes as f64 / BYTES_PER_GB;
                if available >= minimum {
                    Finding::ok(Check::Memory, format!("{:.1}GB available", available))
                } else {
                    Finding::advisory(
                        Check::Memory,
                        format!(
                            "low available memory: {:.1}GB (recommended: {:.1}GB+)",
                            available, minimum
                        ),
                    )
                }
            }
            None => Finding::advisory(Check::Memory, "cannot determine available memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{FixedMemory, MockStore};
    use std::path::Path;
    use tempfile::TempDir;

    /// Config whose model and credential files all exist inside `dir`
    fn create_test_config(dir: &Path) -> MulticamConfig {
        let mut config = MulticamConfig::default();
        for name in ["detection.pt", "ppe.pt", "pose.pt"] {
            std::fs::write(dir.join(name), b"weights").unwrap();
        }
        std::fs::write(dir.join("credentials.json"), b"{}").unwrap();

        config.models.detection = dir.join("detection.pt");
        config.models.ppe_detection = dir.join("ppe.pt");
        config.models.pose_estimation = dir.join("pose.pt");
        config.storage.credentials_path = dir.join("credentials.json");
        config.preflight.min_available_memory_gb = 2.0;
        config
    }

    fn validator(
        config: MulticamConfig,
        store: MockStore,
        memory: FixedMemory,
    ) -> PreflightValidator {
        PreflightValidator::new(Arc::new(config), Arc::new(store), Arc::new(memory))
    }

    #[tokio::test]
    async fn test_healthy_environment_passes() {
        let dir = TempDir::new().unwrap();
        let store = MockStore::new();
        let report = validator(
            create_test_config(dir.path()),
            store.clone(),
            FixedMemory::gigabytes(8.0),
        )
        .validate()
        .await;

        assert!(report.passed());
        assert_eq!(report.len(), 4);
        assert_eq!(report.advisories().count(), 0);
        assert_eq!(store.connects(), 1);
        assert_eq!(store.disconnects(), 1);
        assert!(report.into_result().is_ok());
    }

    #[tokio::test]
    async fn test_missing_model_and_low_memory() {
        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(dir.path());
        config.models.ppe_detection = dir.path().join("absent.pt");

        let report = validator(config, MockStore::new(), FixedMemory::gigabytes(0.5))
            .validate()
            .await;

        assert_eq!(report.len(), 4);
        assert!(!report.passed());
        assert_eq!(report.fatal().count(), 1);
        assert_eq!(report.advisories().count(), 1);
        assert_eq!(report.findings()[0].check, Check::ModelArtifacts);
        assert_eq!(report.findings()[3].check, Check::Memory);

        match report.into_result() {
            Err(MulticamError::PreconditionFailed(message)) => {
                assert!(message.contains("absent.pt"));
            }
            other => panic!("Expected precondition failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_every_check_runs_when_all_fail() {
        let dir = TempDir::new().unwrap();
        let mut config = MulticamConfig::default();
        config.models.detection = dir.path().join("a.pt");
        config.models.ppe_detection = dir.path().join("b.pt");
        config.models.pose_estimation = dir.path().join("c.pt");
        config.storage.credentials_path = dir.path().join("missing.json");

        let report = validator(config, MockStore::unreachable(), FixedMemory(None))
            .validate()
            .await;

        let checks: Vec<Check> = report.findings().iter().map(|f| f.check).collect();
        assert_eq!(
            checks,
            vec![Check::ModelArtifacts, Check::Credentials, Check::Database, Check::Memory]
        );
        assert_eq!(report.fatal().count(), 3);
        assert_eq!(report.advisories().count(), 1);

        // One finding lists every missing model
        match &report.findings()[0].status {
            FindingStatus::Fatal(message) => {
                assert!(message.contains("a.pt"));
                assert!(message.contains("c.pt"));
            }
            other => panic!("Expected fatal finding, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_exactly_at_threshold_is_ok() {
        let dir = TempDir::new().unwrap();
        let report = validator(
            create_test_config(dir.path()),
            MockStore::new(),
            FixedMemory::gigabytes(2.0),
        )
        .validate()
        .await;

        assert!(matches!(report.findings()[3].status, FindingStatus::Ok(_)));
    }
}
