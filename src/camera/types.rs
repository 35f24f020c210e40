use crate::error::{MulticamError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for a single monitored camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Unique, stable key across the active configuration set
    pub camera_id: String,

    #[serde(default)]
    pub name: String,

    /// Network URL or local device locator
    pub stream_url: String,

    /// Single selected capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_case: Option<String>,

    /// Capabilities switched on for this camera
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_use_cases: Vec<String>,

    /// Capabilities this camera may run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_use_cases: Vec<String>,
}

impl CameraConfig {
    /// Create a single-capability camera configuration
    pub fn new<S: Into<String>>(camera_id: S, name: S, stream_url: S, use_case: S) -> Self {
        Self {
            camera_id: camera_id.into(),
            name: name.into(),
            stream_url: stream_url.into(),
            use_case: Some(use_case.into()),
            enabled_use_cases: Vec::new(),
            available_use_cases: Vec::new(),
        }
    }

    /// Create a camera with several capabilities, all of them enabled
    pub fn flexible<S: Into<String>>(
        camera_id: S,
        name: S,
        stream_url: S,
        use_cases: &[&str],
    ) -> Self {
        let tags: Vec<String> = use_cases.iter().map(|tag| tag.to_string()).collect();
        Self {
            camera_id: camera_id.into(),
            name: name.into(),
            stream_url: stream_url.into(),
            use_case: None,
            enabled_use_cases: tags.clone(),
            available_use_cases: tags,
        }
    }

    /// Capabilities the worker for this camera should run.
    ///
    /// The enabled set wins over the single `use_case` when both are present.
    pub fn active_use_cases(&self) -> Vec<&str> {
        if !self.enabled_use_cases.is_empty() {
            self.enabled_use_cases.iter().map(String::as_str).collect()
        } else {
            self.use_case.as_deref().into_iter().collect()
        }
    }

    /// Check the per-camera invariants
    pub fn validate(&self) -> Result<()> {
        if self.camera_id.trim().is_empty() {
            return Err(MulticamError::MalformedConfig(
                "camera_id must not be empty".to_string(),
            ));
        }

        if self.stream_url.trim().is_empty() {
            return Err(MulticamError::MalformedConfig(format!(
                "camera {} has no stream_url",
                self.camera_id
            )));
        }

        if self.active_use_cases().is_empty() {
            return Err(MulticamError::MalformedConfig(format!(
                "camera {} has no use case selected",
                self.camera_id
            )));
        }

        if !self.available_use_cases.is_empty() {
            let available: HashSet<&str> =
                self.available_use_cases.iter().map(String::as_str).collect();
            if let Some(tag) = self
                .enabled_use_cases
                .iter()
                .find(|tag| !available.contains(tag.as_str()))
            {
                return Err(MulticamError::MalformedConfig(format!(
                    "camera {} enables {} which is not in its available use cases",
                    self.camera_id, tag
                )));
            }
        }

        Ok(())
    }

    /// Human-readable label for a capability tag, e.g. `people_counting` -> `People Counting`
    pub fn display_use_case(tag: &str) -> String {
        tag.split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Reject configuration sets that repeat a `camera_id`
pub fn ensure_unique(configs: &[CameraConfig]) -> Result<()> {
    let mut seen = HashSet::with_capacity(configs.len());
    for config in configs {
        if !seen.insert(config.camera_id.as_str()) {
            return Err(MulticamError::DuplicateCameraId(config.camera_id.clone()));
        }
    }
    Ok(())
}

/// Full set-level check: non-empty, unique ids, every camera valid
pub fn validate_set(configs: &[CameraConfig]) -> Result<()> {
    if configs.is_empty() {
        return Err(MulticamError::NoConfigurations);
    }
    ensure_unique(configs)?;
    configs.iter().try_for_each(CameraConfig::validate)
}
