use super::coordinator::CameraOrchestrator;
use super::types::{OrchestratorState, RunSummary, StopReason};
use super::worker::WorkerHandle;
use crate::capability::Pipeline;
use crate::error::{MulticamError, Result};
use crate::events::SupervisorEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

impl CameraOrchestrator {
    /// Launch the loaded workers and supervise them until the run ends.
    ///
    /// With `duration` set the run stops on its own once it elapses.
    pub async fn start(&mut self, duration: Option<Duration>) -> Result<RunSummary> {
        self.launch()?;
        self.supervise(duration).await
    }

    /// Spawn one worker per loaded camera, in configuration order
    pub fn launch(&mut self) -> Result<()> {
        let state = self.state();
        if state != OrchestratorState::Loaded {
            return Err(MulticamError::InvalidState {
                operation: "start",
                state,
            });
        }

        // Resolve everything up front so a lookup failure spawns nothing
        let mut planned: Vec<Vec<(String, Box<dyn Pipeline>)>> =
            Vec::with_capacity(self.configs.len());
        for config in &self.configs {
            let mut pipelines = Vec::new();
            for tag in config.active_use_cases() {
                pipelines.push((tag.to_string(), self.registry.resolve(tag)?));
            }
            planned.push(pipelines);
        }

        let run_id = Uuid::new_v4().to_string();
        info!("Starting run {} with {} cameras", run_id, self.configs.len());

        self.run_token = CancellationToken::new();
        let (exit_sender, exit_receiver) = mpsc::unbounded_channel();
        self.exits = Some(exit_receiver);
        self.handle
            .begin_run(self.configs.iter().map(|c| c.camera_id.clone()).collect());

        for (config, pipelines) in self.configs.iter().zip(planned) {
            let worker = WorkerHandle::spawn(
                Arc::clone(config),
                pipelines,
                self.run_token.child_token(),
                exit_sender.clone(),
            );
            info!(
                "Worker started for {} ({})",
                config.camera_id,
                config.active_use_cases().join(", ")
            );
            self.event_bus.publish(SupervisorEvent::WorkerStarted {
                camera_id: config.camera_id.clone(),
            });
            self.workers.push(worker);
        }

        self.run_id = Some(run_id);
        self.set_state(OrchestratorState::Running);
        Ok(())
    }

    /// Block until the running set should stop, then stop it.
    ///
    /// Ends on the first of: the optional deadline, a handle stop request,
    /// SIGINT/SIGTERM, a worker failure when halting on failure is enabled,
    /// or, for an unbounded run only, every worker having exited.
    pub async fn supervise(&mut self, duration: Option<Duration>) -> Result<RunSummary> {
        let state = self.state();
        if state != OrchestratorState::Running {
            return Err(MulticamError::InvalidState {
                operation: "supervise",
                state,
            });
        }

        let started = Instant::now();
        let deadline = duration.map(|d| started + d);
        let stop_request = self.handle.stop_request();
        let mut signals = ShutdownSignals::install()?;
        let mut exits = self.exits.take().ok_or_else(|| {
            MulticamError::component("orchestrator", "worker exit channel already taken")
        })?;

        if let Some(d) = duration {
            info!("Run bounded to {:?}", d);
        }

        let reason = loop {
            // A bounded run keeps its deadline even with nothing left to supervise
            if deadline.is_none() && self.handle.live_workers().is_empty() {
                break StopReason::AllWorkersExited;
            }

            tokio::select! {
                _ = wait_until(deadline) => break StopReason::DeadlineElapsed,
                _ = stop_request.cancelled() => break StopReason::StopRequested,
                name = signals.recv() => {
                    info!("Received {} signal", name);
                    break StopReason::Signal(name.to_string());
                }
                Some(exit) = exits.recv() => {
                    if let Some(failure) = self.record_exit(exit) {
                        if self.halt_on_worker_failure {
                            warn!("Halting run after failure of {}", failure.camera_id);
                            break StopReason::WorkerFailure(failure.camera_id);
                        }
                    }
                }
            }
        };

        self.exits = Some(exits);
        self.event_bus.publish(SupervisorEvent::ShutdownRequested {
            reason: reason.clone(),
        });

        let stop = self.stop().await?;
        let summary = RunSummary {
            run_id: self.run_id.take().unwrap_or_default(),
            reason,
            elapsed: started.elapsed(),
            failures: self.handle.failures(),
            stop,
        };
        info!(
            "Run {} finished after {:.1}s: {:?}, {} worker failures",
            summary.run_id,
            summary.elapsed.as_secs_f64(),
            summary.reason,
            summary.failures.len()
        );
        Ok(summary)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Operator interrupt sources: SIGINT everywhere, SIGTERM on unix
struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: signal::unix::Signal,
    #[cfg(unix)]
    terminate: signal::unix::Signal,
}

impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            interrupt: signal::unix::signal(signal::unix::SignalKind::interrupt())?,
            #[cfg(unix)]
            terminate: signal::unix::signal(signal::unix::SignalKind::terminate())?,
        })
    }

    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            Some(()) = self.interrupt.recv() => "SIGINT",
            Some(()) = self.terminate.recv() => "SIGTERM",
            else => std::future::pending().await,
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> &'static str {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(_) => std::future::pending().await,
        }
    }
}
