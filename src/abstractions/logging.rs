use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::abstractions::{Event, ProcessId};

/// An event as published by the process that logged it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservedEvent {
    pub process_id: ProcessId,
    pub event: Event,
}

/// Forwards observed events of one simulation run to `tracing`.
pub struct ScopedEventLogger {
    run_id: Uuid,
    event_receiver: Receiver<ObservedEvent>,
}

impl ScopedEventLogger {
    pub fn new(run_id: Uuid, event_receiver: Receiver<ObservedEvent>) -> Self {
        Self {
            run_id,
            event_receiver,
        }
    }

    /// Spawns [`ScopedEventLogger::run`] inside the caller's span.
    pub fn start(self) -> JoinHandle<usize> {
        tokio::spawn(self.run().in_current_span())
    }

    /// Logs until every sender is dropped and returns the number of events logged.
    pub async fn run(mut self) -> usize {
        let mut logged = 0;
        loop {
            match self.event_receiver.recv().await {
                Ok(ObservedEvent { process_id, event }) => {
                    info!(
                        run_id = %self.run_id,
                        process = process_id,
                        kind = ?event.kind,
                        timestamp = event.timestamp,
                        source = ?event.source,
                        destination = ?event.destination,
                        "{event}"
                    );
                    logged += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(run_id = %self.run_id, skipped, "event logger lagged");
                }
                Err(RecvError::Closed) => return logged,
            }
        }
    }
}
