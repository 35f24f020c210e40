use crate::camera::CameraConfig;
use crate::capability::Pipeline;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Sent by a worker task exactly once, when all of its pipelines are done
#[derive(Debug)]
pub(super) struct WorkerExit {
    pub camera_id: String,
    pub outcome: std::result::Result<(), String>,
}

/// Runtime binding of one camera to its running pipelines
#[derive(Debug)]
pub struct WorkerHandle {
    pub(super) camera_id: String,
    pub(super) cancel: CancellationToken,
    pub(super) join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn a worker running every given pipeline against `camera`.
    ///
    /// The first pipeline error cancels the worker's remaining pipelines and
    /// becomes the worker's outcome. Siblings on other cameras are untouched.
    pub(super) fn spawn(
        camera: Arc<CameraConfig>,
        pipelines: Vec<(String, Box<dyn Pipeline>)>,
        cancel: CancellationToken,
        exits: mpsc::UnboundedSender<WorkerExit>,
    ) -> Self {
        let camera_id = camera.camera_id.clone();
        let worker_cancel = cancel.clone();

        let join = tokio::spawn(async move {
            let mut set = JoinSet::new();
            for (tag, pipeline) in pipelines {
                let camera = Arc::clone(&camera);
                let cancel = worker_cancel.clone();
                set.spawn(async move { (tag, pipeline.run(camera, cancel).await) });
            }

            let mut outcome = Ok(());
            while let Some(joined) = set.join_next().await {
                let failure = match joined {
                    Ok((tag, Ok(()))) => {
                        debug!("{} pipeline for {} finished", tag, camera.camera_id);
                        None
                    }
                    Ok((tag, Err(e))) => Some(format!("{} pipeline: {}", tag, e)),
                    Err(e) if e.is_panic() => Some("pipeline panicked".to_string()),
                    Err(e) => Some(e.to_string()),
                };

                if let Some(message) = failure {
                    if outcome.is_ok() {
                        error!("Camera {} worker failing: {}", camera.camera_id, message);
                        worker_cancel.cancel();
                        outcome = Err(message);
                    }
                }
            }

            // Receiver is gone once the orchestrator stopped supervising
            let _ = exits.send(WorkerExit {
                camera_id: camera.camera_id.clone(),
                outcome,
            });
        });

        Self {
            camera_id,
            cancel,
            join,
        }
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
