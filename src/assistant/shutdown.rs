//! Staged shutdown.
//!
//! Tasks are registered against a [`Stage`]. Shutdown cancels one stage at a
//! time, in declaration order, and waits for its tasks before moving on.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on how long one stage may take to drain.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Sensors,
    Suggestions,
    Presentation,
}

impl Stage {
    pub const ORDER: [Stage; 3] = [Stage::Sensors, Stage::Suggestions, Stage::Presentation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Sensors => "sensors",
            Stage::Suggestions => "suggestions",
            Stage::Presentation => "presentation",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

struct StageTasks {
    token: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

pub struct ShutdownCoordinator {
    stages: [StageTasks; 3],
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let stage = || StageTasks {
            token: CancellationToken::new(),
            handles: Vec::new(),
        };
        Self {
            stages: [stage(), stage(), stage()],
        }
    }

    /// Token cancelled when `stage` begins shutting down.
    pub fn token(&self, stage: Stage) -> CancellationToken {
        self.stages[stage.index()].token.clone()
    }

    /// Spawn `task` on the runtime and track it under `stage`.
    pub fn spawn<F>(&mut self, stage: Stage, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug!(stage = stage.as_str(), task = name, "Task started");
        self.stages[stage.index()].handles.push((name, tokio::spawn(task)));
    }

    pub fn task_count(&self) -> usize {
        self.stages.iter().map(|s| s.handles.len()).sum()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.stages[Stage::Sensors.index()].token.is_cancelled()
    }

    /// Cancel and drain every stage in order. Tasks still running after
    /// `stage_timeout` are aborted.
    pub async fn graceful_shutdown(&mut self, stage_timeout: Duration) {
        for stage in Stage::ORDER {
            let tasks = &mut self.stages[stage.index()];
            tasks.token.cancel();

            let handles = std::mem::take(&mut tasks.handles);
            if handles.is_empty() {
                continue;
            }
            info!(
                stage = stage.as_str(),
                task_count = handles.len(),
                timeout_ms = stage_timeout.as_millis() as u64,
                "Waiting for tasks to stop"
            );

            let aborts: Vec<_> = handles
                .iter()
                .map(|(name, handle)| (*name, handle.abort_handle()))
                .collect();
            let drain = join_all(handles.into_iter().map(|(_, handle)| handle));

            match tokio::time::timeout(stage_timeout, drain).await {
                Ok(results) => {
                    for ((name, _), result) in aborts.iter().zip(results) {
                        if let Err(err) = result {
                            warn!(stage = stage.as_str(), task = name, error = %err, "Task ended abnormally");
                        }
                    }
                }
                Err(_) => {
                    warn!(stage = stage.as_str(), "Tasks did not stop in time, aborting");
                    // Aborting a finished task is a no-op.
                    for (_, abort) in aborts {
                        abort.abort();
                    }
                }
            }
        }
        info!("Shutdown complete");
    }
}
