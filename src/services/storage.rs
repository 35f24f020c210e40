use super::{ObjectStorage, StorageConnector};
use crate::config::StorageConfig;
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Fields of a service account credentials file the client relies on
#[derive(Debug, Deserialize)]
struct ServiceAccount {
    client_email: String,
    #[serde(default)]
    project_id: Option<String>,
}

/// Opens storage clients for the configured bucket
#[derive(Debug, Clone)]
pub struct GcsConnector {
    config: StorageConfig,
}

impl GcsConnector {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StorageConnector for GcsConnector {
    async fn open(&self) -> Result<Box<dyn ObjectStorage>> {
        Ok(Box::new(GcsStorage::open(self.config.clone()).await?))
    }
}

/// Bucket connectivity client
pub struct GcsStorage {
    config: StorageConfig,
    account: ServiceAccount,
    client: reqwest::Client,
}

impl GcsStorage {
    pub async fn open(config: StorageConfig) -> Result<Self> {
        let raw = tokio::fs::read_to_string(&config.credentials_path)
            .await
            .map_err(|e| {
                MulticamError::unavailable(
                    "storage credentials",
                    format!("{}: {}", config.credentials_path.display(), e),
                )
            })?;
        let account: ServiceAccount = serde_json::from_str(&raw)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MulticamError::component("storage".to_string(), e.to_string()))?;

        debug!(
            "Opened storage client for bucket {} as {}",
            config.bucket_name, account.client_email
        );

        Ok(Self {
            config,
            account,
            client,
        })
    }

    fn bucket_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket_name
        )
    }
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    /// Any answer other than 404 proves the endpoint and bucket exist
    async fn test_connection(&mut self) -> Result<bool> {
        if let Some(project) = self.account.project_id.as_deref() {
            if project != self.config.project_id {
                info!(
                    "Credentials belong to project {} but {} is configured",
                    project, self.config.project_id
                );
            }
        }

        let response = self
            .client
            .head(self.bucket_url())
            .send()
            .await
            .map_err(|e| MulticamError::unavailable("object storage", e.to_string()))?;

        debug!("Bucket probe returned {}", response.status());
        Ok(response.status() != StatusCode::NOT_FOUND)
    }

    async fn stop(self: Box<Self>) {
        debug!("Releasing storage client for bucket {}", self.config.bucket_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_open_requires_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            credentials_path: dir.path().join("missing.json"),
            ..StorageConfig::default()
        };

        match GcsStorage::open(config).await {
            Err(MulticamError::SourceUnavailable { resource, .. }) => {
                assert_eq!(resource, "storage credentials")
            }
            Err(e) => panic!("Unexpected error: {}", e),
            Ok(_) => panic!("Expected missing credentials to fail"),
        }
    }

    #[tokio::test]
    async fn test_open_parses_service_account() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type": "service_account", "client_email": "cam@multicam.iam", "project_id": "multicam"}}"#
        )
        .unwrap();

        let config = StorageConfig {
            credentials_path: file.path().to_path_buf(),
            endpoint: "https://storage.example.test/".to_string(),
            bucket_name: "frames".to_string(),
            ..StorageConfig::default()
        };

        let storage = GcsStorage::open(config).await.unwrap();
        assert_eq!(storage.account.client_email, "cam@multicam.iam");
        assert_eq!(storage.bucket_url(), "https://storage.example.test/frames");
    }
}
