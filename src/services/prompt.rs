use super::ConfigCollector;
use crate::camera::{ensure_unique, CameraConfig};
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Line-based camera entry on standard input.
///
/// Each line is `camera_id | name | stream_url | use_case[,use_case...]`.
/// A blank line finishes the list; `abort` returns an empty list.
#[derive(Debug, Default)]
pub struct PromptCollector;

impl PromptCollector {
    pub fn new() -> Self {
        Self
    }
}

/// Parse one operator entry
pub fn parse_entry(line: &str) -> Result<CameraConfig> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(MulticamError::MalformedConfig(format!(
            "expected 4 '|'-separated fields, got {}",
            fields.len()
        )));
    }

    let tags: Vec<&str> = fields[3]
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .collect();

    let config = match tags.as_slice() {
        [single] => CameraConfig::new(fields[0], fields[1], fields[2], *single),
        _ => CameraConfig::flexible(fields[0], fields[1], fields[2], &tags),
    };
    config.validate()?;
    Ok(config)
}

#[async_trait]
impl ConfigCollector for PromptCollector {
    async fn collect(&self) -> Result<Vec<CameraConfig>> {
        println!("Enter cameras as: camera_id | name | stream_url | use_case[,use_case]");
        println!("Finish with an empty line, or type 'abort' to cancel.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut configs: Vec<CameraConfig> = Vec::new();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            if line.eq_ignore_ascii_case("abort") {
                return Ok(Vec::new());
            }

            match parse_entry(line) {
                Ok(config) => {
                    let mut candidate = configs.clone();
                    candidate.push(config);
                    match ensure_unique(&candidate) {
                        Ok(()) => {
                            println!("Added camera {}", candidate[candidate.len() - 1].camera_id);
                            configs = candidate;
                        }
                        Err(e) => println!("Rejected: {}", e),
                    }
                }
                Err(e) => {
                    warn!("Rejected camera entry: {}", e);
                    println!("Rejected: {}", e);
                }
            }
        }

        Ok(configs)
    }
}
