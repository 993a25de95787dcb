use std::fmt;

pub mod clock;
pub mod communication;
pub mod logging;
pub mod process;

pub type ProcessId = usize;
pub type Timestamp = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Local,
    Sent,
    Received,
}

/// A single step in a process log.
///
/// `source` and `destination` are only set for `Sent` and `Received` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: Timestamp,
    pub source: Option<ProcessId>,
    pub destination: Option<ProcessId>,
}

impl Event {
    pub fn local(timestamp: Timestamp) -> Self {
        Self {
            kind: EventKind::Local,
            timestamp,
            source: None,
            destination: None,
        }
    }

    pub fn sent(timestamp: Timestamp, source: ProcessId, destination: ProcessId) -> Self {
        Self {
            kind: EventKind::Sent,
            timestamp,
            source: Some(source),
            destination: Some(destination),
        }
    }

    pub fn received(timestamp: Timestamp, source: ProcessId, destination: ProcessId) -> Self {
        Self {
            kind: EventKind::Received,
            timestamp,
            source: Some(source),
            destination: Some(destination),
        }
    }

    /// The (source, destination) pair of a message event.
    pub fn endpoints(&self) -> Option<(ProcessId, ProcessId)> {
        self.source.zip(self.destination)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.source, self.destination) {
            (EventKind::Sent, _, Some(dst)) => write!(f, "s{}@{}", dst, self.timestamp),
            (EventKind::Received, Some(src), _) => write!(f, "r{}@{}", src, self.timestamp),
            _ => write!(f, "l@{}", self.timestamp),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    pub timestamp: Timestamp,
}
