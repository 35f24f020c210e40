//! Statement-by-statement schema bootstrap with partial-failure tolerance

use crate::error::{MulticamError, Result};
use crate::services::StoreConnector;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// MySQL error fragments that mean the object is already in place
const ALREADY_APPLIED_MARKERS: [&str; 2] = ["already exists", "duplicate"];

/// Drop `--` comment lines, then split on `;` and skip empty statements
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .split(';')
        .map(|statement| statement.trim().to_string())
        .filter(|statement| !statement.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Replaying a statement whose effect is already present
    AlreadyApplied,
    Rejected,
}

impl FailureClass {
    fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        if ALREADY_APPLIED_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            FailureClass::AlreadyApplied
        } else {
            FailureClass::Rejected
        }
    }
}

#[derive(Debug)]
pub struct StatementFailure {
    pub class: FailureClass,
    /// Always `MulticamError::PartialSchemaFailure`
    pub error: MulticamError,
}

#[derive(Debug, Default)]
pub struct SchemaReport {
    pub applied: usize,
    pub failures: Vec<StatementFailure>,
}

impl SchemaReport {
    pub fn total(&self) -> usize {
        self.applied + self.failures.len()
    }

    pub fn rejected(&self) -> usize {
        self.failures
            .iter()
            .filter(|f| f.class == FailureClass::Rejected)
            .count()
    }
}

pub struct SchemaInitializer {
    store: Arc<dyn StoreConnector>,
}

impl SchemaInitializer {
    pub fn new(store: Arc<dyn StoreConnector>) -> Self {
        Self { store }
    }

    /// Apply the schema script at `path`.
    ///
    /// Fails only when the script is missing or the store refuses a
    /// connection; individual statement errors land in the report.
    pub async fn initialize(&self, path: &Path) -> Result<SchemaReport> {
        let script = match tokio::fs::read_to_string(path).await {
            Ok(script) => script,
            Err(e) => {
                return Err(MulticamError::unavailable(
                    format!("schema file {}", path.display()),
                    e.to_string(),
                ))
            }
        };
        let statements = split_statements(&script);
        info!(
            "Applying {} schema statements from {}",
            statements.len(),
            path.display()
        );

        let mut session = self
            .store
            .connect()
            .await
            .map_err(|e| MulticamError::unavailable("database", e.to_string()))?;

        let mut report = SchemaReport::default();
        for (index, statement) in statements.iter().enumerate() {
            match session.execute(statement).await {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    let message = e.to_string();
                    let class = FailureClass::classify(&message);
                    match class {
                        FailureClass::AlreadyApplied => {
                            info!("Schema statement {} already applied: {}", index + 1, message)
                        }
                        FailureClass::Rejected => {
                            warn!("Schema statement {} failed: {}", index + 1, message)
                        }
                    }
                    report.failures.push(StatementFailure {
                        class,
                        error: MulticamError::PartialSchemaFailure {
                            index: index + 1,
                            message,
                        },
                    });
                }
            }
        }
        session.disconnect().await;

        info!(
            "Database schema initialized: {} applied, {} skipped",
            report.applied,
            report.failures.len()
        );
        Ok(report)
    }
}
