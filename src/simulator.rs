//! Simulation orchestration.
//!
//! ```text
//! script --> Script --> ChannelMatrix + one Process per line
//!                                  |
//!                  one tokio task per process (JoinSet)
//!                                  |
//!                      join all (optional liveness bound)
//!                                  |
//!                               History
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::abstractions::communication::ChannelMatrix;
use crate::abstractions::logging::ObservedEvent;
use crate::abstractions::process::Process;
use crate::config::SimulatorConfig;
use crate::error::{ProcessError, SimulationError};
use crate::history::History;
use crate::script::Script;

const NODE_ID: [u8; 6] = *b"lampsm";

type ProcessTasks = JoinSet<Result<Process, ProcessError>>;

/// Runs scripts with one concurrent task per process.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
    observer: Option<broadcast::Sender<ObservedEvent>>,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Every event logged by any process is also published to `observer`.
    pub fn with_observer(mut self, observer: broadcast::Sender<ObservedEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// A fresh time-based identifier for a run.
    pub fn new_run_id() -> Uuid {
        Uuid::now_v1(&NODE_ID)
    }

    /// Parses `script` and runs it. Parse errors abort before any process starts.
    pub async fn run(&self, script: &str) -> Result<History, SimulationError> {
        let script = Script::parse(script)?;
        self.run_script(&script).await
    }

    pub async fn run_script(&self, script: &Script) -> Result<History, SimulationError> {
        self.run_script_with_id(Self::new_run_id(), script).await
    }

    /// Runs `script` under a caller-chosen `run_id`, e.g. one shared with a
    /// [`ScopedEventLogger`](crate::abstractions::logging::ScopedEventLogger).
    pub async fn run_script_with_id(
        &self,
        run_id: Uuid,
        script: &Script,
    ) -> Result<History, SimulationError> {
        let span = info_span!("simulation", %run_id, processes = script.process_count());
        self.execute(run_id, script).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, script: &Script) -> Result<History, SimulationError> {
        let process_count = script.process_count();
        let matrix = ChannelMatrix::new(process_count, self.config.channel_capacity);
        let cancel_token = CancellationToken::new();

        let mut tasks = ProcessTasks::new();
        for (id, ((link_sender, link_receiver), operations)) in matrix
            .into_links()
            .into_iter()
            .zip(script.processes())
            .enumerate()
        {
            let mut process = Process::new(id, link_sender, link_receiver);
            if let Some(observer) = &self.observer {
                process = process.with_observer(observer.clone());
            }
            tasks.spawn(
                process
                    .run(operations.clone(), cancel_token.clone())
                    .in_current_span(),
            );
        }
        info!(capacity = self.config.channel_capacity.get(), "processes launched");

        // Finished processes keep their inbound channels open until the run ends.
        let mut finished: Vec<Option<Process>> = (0..process_count).map(|_| None).collect();

        let joined = match self.config.liveness_timeout {
            Some(timeout) => {
                let outcome = tokio::time::timeout(timeout, join_all(&mut tasks, &mut finished)).await;
                match outcome {
                    Ok(joined) => joined,
                    Err(_) => {
                        cancel_token.cancel();
                        return Err(collect_blocked(tasks, timeout).await);
                    }
                }
            }
            None => join_all(&mut tasks, &mut finished).await,
        };

        if let Err(err) = joined {
            warn!(error = %err, "simulation aborted");
            cancel_token.cancel();
            tasks.shutdown().await;
            return Err(err);
        }

        let logs: BTreeMap<_, _> = finished
            .into_iter()
            .flatten()
            .map(|process| (process.id(), process.into_events()))
            .collect();
        info!(events = logs.values().map(Vec::len).sum::<usize>(), "simulation finished");

        Ok(History::new(run_id, logs))
    }
}

async fn join_all(
    tasks: &mut ProcessTasks,
    finished: &mut [Option<Process>],
) -> Result<(), SimulationError> {
    while let Some(joined) = tasks.join_next().await {
        let process = joined??;
        debug!(process = process.id(), "process joined");
        let id = process.id();
        finished[id] = Some(process);
    }
    Ok(())
}

/// Drains cancelled tasks and reports the operation each one was blocked on.
async fn collect_blocked(mut tasks: ProcessTasks, timeout: Duration) -> SimulationError {
    let mut blocked = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(process)) => debug!(process = process.id(), "process finished after deadline"),
            Ok(Err(err)) => blocked.push(err),
            Err(err) => return SimulationError::Join(err),
        }
    }
    blocked.sort_by_key(ProcessError::process);

    for err in &blocked {
        warn!(error = %err, "process did not finish");
    }
    SimulationError::Liveness { timeout, blocked }
}
