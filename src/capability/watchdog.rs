use super::Pipeline;
use crate::camera::{CameraConfig, StreamLocator};
use crate::config::PipelineConfig;
use crate::error::{MulticamError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Keeps a camera's stream under watch for one capability.
///
/// Each processing unit probes the stream source; the pipeline fails once
/// the source stays unreachable for `max_failures` consecutive units.
#[derive(Debug, Clone)]
pub struct StreamWatchdog {
    capability: String,
    interval: Duration,
    probe_timeout: Duration,
    max_failures: u32,
}

impl StreamWatchdog {
    pub fn new(
        capability: &str,
        interval: Duration,
        probe_timeout: Duration,
        max_failures: u32,
    ) -> Self {
        Self {
            capability: capability.to_string(),
            interval,
            probe_timeout,
            max_failures: max_failures.max(1),
        }
    }

    pub fn from_config(capability: &str, settings: &PipelineConfig) -> Self {
        Self::new(
            capability,
            Duration::from_millis(settings.probe_interval_ms),
            Duration::from_millis(settings.probe_timeout_ms),
            settings.max_consecutive_failures,
        )
    }

    async fn probe(&self, locator: &StreamLocator) -> std::result::Result<(), String> {
        match locator {
            StreamLocator::Network { host, port } => {
                let connect = TcpStream::connect((host.as_str(), *port));
                match timeout(self.probe_timeout, connect).await {
                    Ok(Ok(_stream)) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("no answer within {:?}", self.probe_timeout)),
                }
            }
            StreamLocator::Device(path) => tokio::fs::metadata(path)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }
}

#[async_trait]
impl Pipeline for StreamWatchdog {
    async fn run(
        self: Box<Self>,
        camera: Arc<CameraConfig>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let locator = StreamLocator::parse(&camera.stream_url)?;
        info!(
            "{} pipeline watching {} at {}",
            CameraConfig::display_use_case(&self.capability),
            camera.camera_id,
            locator.describe()
        );

        let mut consecutive_failures = 0u32;
        let mut units = 0u64;

        while !cancel.is_cancelled() {
            match self.probe(&locator).await {
                Ok(()) => {
                    if consecutive_failures > 0 {
                        info!("Stream for {} reachable again", camera.camera_id);
                    }
                    consecutive_failures = 0;
                }
                Err(reason) => {
                    consecutive_failures += 1;
                    warn!(
                        "Stream for {} unreachable ({}/{}): {}",
                        camera.camera_id, consecutive_failures, self.max_failures, reason
                    );
                    if consecutive_failures >= self.max_failures {
                        return Err(MulticamError::worker(
                            camera.camera_id.clone(),
                            format!(
                                "{} stream {} unreachable after {} attempts: {}",
                                self.capability,
                                locator.describe(),
                                consecutive_failures,
                                reason
                            ),
                        ));
                    }
                }
            }
            units += 1;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        debug!(
            "{} pipeline for {} stopped after {} units",
            self.capability, camera.camera_id, units
        );
        Ok(())
    }
}
