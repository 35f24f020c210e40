use super::{StoreConnector, StoreSession};
use crate::camera::CameraConfig;
use crate::config::DatabaseConfig;
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Active camera configurations, list columns rendered as JSON text
const CAMERA_QUERY: &str = r#"
    SELECT camera_id, name, stream_url, use_case,
           CAST(enabled_use_cases AS CHAR) AS enabled_use_cases,
           CAST(available_use_cases AS CHAR) AS available_use_cases
    FROM camera_configurations
    WHERE is_active = TRUE
    ORDER BY camera_id
"#;

/// Connects to the MySQL configuration store
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    config: DatabaseConfig,
}

impl MySqlConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database)
    }

    fn target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.config.user, self.config.host, self.config.port, self.config.database
        )
    }
}

#[async_trait]
impl StoreConnector for MySqlConnector {
    async fn connect(&self) -> Result<Box<dyn StoreSession>> {
        debug!("Connecting to database {}", self.target());

        let options = self.options();
        let connection = timeout(self.config.connect_timeout(), options.connect())
            .await
            .map_err(|_| {
                MulticamError::unavailable(
                    "database",
                    format!("connection to {} timed out", self.target()),
                )
            })?
            .map_err(|e| MulticamError::unavailable("database", e.to_string()))?;

        Ok(Box::new(MySqlSession { connection }))
    }
}

struct MySqlSession {
    connection: MySqlConnection,
}

#[derive(sqlx::FromRow)]
struct CameraRow {
    camera_id: String,
    name: Option<String>,
    stream_url: String,
    use_case: Option<String>,
    enabled_use_cases: Option<String>,
    available_use_cases: Option<String>,
}

impl CameraRow {
    fn into_config(self) -> Result<CameraConfig> {
        let enabled_use_cases = parse_tag_list(&self.camera_id, self.enabled_use_cases)?;
        let available_use_cases = parse_tag_list(&self.camera_id, self.available_use_cases)?;

        Ok(CameraConfig {
            name: self.name.unwrap_or_else(|| self.camera_id.clone()),
            camera_id: self.camera_id,
            stream_url: self.stream_url,
            use_case: self.use_case.filter(|tag| !tag.is_empty()),
            enabled_use_cases,
            available_use_cases,
        })
    }
}

fn parse_tag_list(camera_id: &str, raw: Option<String>) -> Result<Vec<String>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| {
            MulticamError::MalformedConfig(format!(
                "camera {} has an invalid use case list: {}",
                camera_id, e
            ))
        }),
    }
}

#[async_trait]
impl StoreSession for MySqlSession {
    async fn query_configs(&mut self) -> Result<Vec<CameraConfig>> {
        let rows = sqlx::query_as::<_, CameraRow>(CAMERA_QUERY)
            .fetch_all(&mut self.connection)
            .await
            .map_err(|e| MulticamError::unavailable("database", e.to_string()))?;

        rows.into_iter().map(CameraRow::into_config).collect()
    }

    async fn execute(&mut self, statement: &str) -> Result<()> {
        self.connection
            .execute(statement)
            .await
            .map(|_| ())
            .map_err(|e| MulticamError::component("database".to_string(), e.to_string()))
    }

    async fn disconnect(self: Box<Self>) {
        let MySqlSession { connection } = *self;
        if let Err(e) = connection.close().await {
            warn!("Error closing database connection: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_with_flexible_use_cases() {
        let row = CameraRow {
            camera_id: "cam_01".to_string(),
            name: None,
            stream_url: "rtsp://10.0.0.5/stream1".to_string(),
            use_case: None,
            enabled_use_cases: Some(r#"["people_counting"]"#.to_string()),
            available_use_cases: Some(r#"["people_counting", "ppe_detection"]"#.to_string()),
        };

        let config = row.into_config().unwrap();
        assert_eq!(config.name, "cam_01");
        assert_eq!(config.active_use_cases(), vec!["people_counting"]);
        assert_eq!(config.available_use_cases.len(), 2);
    }

    #[test]
    fn test_row_with_invalid_tag_list() {
        let row = CameraRow {
            camera_id: "cam_02".to_string(),
            name: Some("Dock".to_string()),
            stream_url: "rtsp://10.0.0.6/stream1".to_string(),
            use_case: Some("intrusion_zone".to_string()),
            enabled_use_cases: Some("not json".to_string()),
            available_use_cases: None,
        };

        assert!(matches!(
            row.into_config(),
            Err(MulticamError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_connector_target_omits_password() {
        let connector = MySqlConnector::new(DatabaseConfig {
            password: "secret".to_string(),
            ..DatabaseConfig::default()
        });
        assert!(!connector.target().contains("secret"));
    }
}
