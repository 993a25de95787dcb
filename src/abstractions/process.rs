use std::fmt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::abstractions::clock::LogicalClock;
use crate::abstractions::communication::{
    LinkReceiver, LinkSender, LocalProcessReceiver, LocalProcessSender,
};
use crate::abstractions::logging::ObservedEvent;
use crate::abstractions::{Event, Message, ProcessId, Timestamp};
use crate::error::{LinkError, ProcessError};

/// One scripted step of a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Local,
    Send(ProcessId),
    Receive(ProcessId),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Local => write!(f, "l"),
            Operation::Send(to) => write!(f, "s{to}"),
            Operation::Receive(from) => write!(f, "r{from}"),
        }
    }
}

/// A sequential actor with its own clock, links to every peer and an
/// append-only event log.
///
/// Operation targets are not validated here; the script interpreter rejects
/// out of range ids before any process is built.
pub struct Process<LS = LocalProcessSender, LR = LocalProcessReceiver> {
    id: ProcessId,
    clock: LogicalClock,
    link_sender: LS,
    link_receiver: LR,
    events: Vec<Event>,
    observer: Option<broadcast::Sender<ObservedEvent>>,
}

impl<LS, LR> Process<LS, LR>
where
    LS: LinkSender<ProcessId, Message> + Send,
    LR: LinkReceiver<ProcessId, Message> + Send,
{
    pub fn new(id: ProcessId, link_sender: LS, link_receiver: LR) -> Self {
        Self {
            id,
            clock: LogicalClock::new(id),
            link_sender,
            link_receiver,
            events: Vec::new(),
            observer: None,
        }
    }

    /// Publishes every logged event to `observer` as well.
    pub fn with_observer(mut self, observer: broadcast::Sender<ObservedEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn local(&mut self) -> Timestamp {
        let timestamp = self.clock.tick(0);
        self.log(Event::local(timestamp));
        timestamp
    }

    pub async fn send(&mut self, to: ProcessId) -> Result<Timestamp, LinkError> {
        let timestamp = self.clock.tick(0);
        self.link_sender.send(to, Message { timestamp }).await?;
        self.log(Event::sent(timestamp, self.id, to));
        Ok(timestamp)
    }

    pub async fn recv(&mut self, from: ProcessId) -> Result<Timestamp, LinkError> {
        let message = self.link_receiver.recv(from).await?;
        let timestamp = self.clock.tick(message.timestamp);
        self.log(Event::received(timestamp, from, self.id));
        Ok(timestamp)
    }

    pub async fn execute(&mut self, operation: Operation) -> Result<Timestamp, LinkError> {
        match operation {
            Operation::Local => Ok(self.local()),
            Operation::Send(to) => self.send(to).await,
            Operation::Receive(from) => self.recv(from).await,
        }
    }

    /// Executes `operations` in order and hands the finished process back.
    ///
    /// The returned process still owns its inbound channels, so peers can keep
    /// enqueueing into its buffers until the caller drops it.
    pub async fn run(
        mut self,
        operations: Vec<Operation>,
        cancel_token: CancellationToken,
    ) -> Result<Self, ProcessError> {
        let id = self.id;
        debug!(process = id, operations = operations.len(), "process started");

        for (step, operation) in operations.into_iter().enumerate() {
            let result = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    return Err(ProcessError::Cancelled {
                        process: id,
                        step,
                        operation,
                    });
                }
                result = self.execute(operation) => result,
            };

            if let Err(source) = result {
                return Err(ProcessError::Link {
                    process: id,
                    step,
                    source,
                });
            }
        }

        debug!(
            process = self.id,
            events = self.events.len(),
            clock = self.clock.current(),
            "process finished"
        );
        Ok(self)
    }

    fn log(&mut self, event: Event) {
        debug!(process = self.id, %event, "event logged");
        if let Some(observer) = &self.observer {
            let _ = observer.send(ObservedEvent {
                process_id: self.id,
                event,
            });
        }
        self.events.push(event);
    }
}
