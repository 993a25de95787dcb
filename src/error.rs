//! Error types for the simulator.
//!
//! Every failure is terminal for a run. Script errors abort before any
//! process starts; process and liveness errors abort after cancelling every
//! process that is still running.

use std::time::Duration;

use crate::abstractions::process::Operation;
use crate::abstractions::ProcessId;

/// Errors raised while interpreting a process script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The operation is not one of `l`, `s<N>` or `r<N>`.
    #[error("unknown operation `{op}` in line {line_number} (`{line}`)")]
    UnknownOperation {
        op: String,
        line_number: usize,
        line: String,
    },

    /// The operation targets a process that is not declared in the script.
    #[error(
        "operation `{op}` in line {line_number} (`{line}`) targets a process outside 0..{process_count}"
    )]
    ProcessOutOfRange {
        op: String,
        line_number: usize,
        line: String,
        process_count: usize,
    },

    /// No line of the script declares a process.
    #[error("script declares no processes")]
    NoProcesses,
}

/// Errors raised by a point-to-point link between two processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// The other end of the channel has been dropped.
    #[error("channel p{from} -> p{to} is closed")]
    Closed { from: ProcessId, to: ProcessId },

    /// The channel matrix has no channel for this pair.
    #[error("no channel p{from} -> p{to}")]
    Missing { from: ProcessId, to: ProcessId },
}

/// Errors that stop a single process before it finished its operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    /// The run was cancelled while the process was blocked.
    #[error("p{process} cancelled at step {step} while blocked on `{operation}`")]
    Cancelled {
        process: ProcessId,
        step: usize,
        operation: Operation,
    },

    #[error("p{process} failed at step {step}: {source}")]
    Link {
        process: ProcessId,
        step: usize,
        #[source]
        source: LinkError,
    },
}

impl ProcessError {
    pub fn process(&self) -> ProcessId {
        match self {
            Self::Cancelled { process, .. } | Self::Link { process, .. } => *process,
        }
    }
}

/// Errors returned by a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Some processes did not finish within the liveness bound.
    #[error("liveness timeout after {timeout:?}: {}", describe_blocked(.blocked))]
    Liveness {
        timeout: Duration,
        blocked: Vec<ProcessError>,
    },

    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// A process task panicked or was aborted.
    #[error("process task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors raised while loading simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: `{value}` ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("channel capacity must be at least 1")]
    ZeroCapacity,
}

fn describe_blocked(blocked: &[ProcessError]) -> String {
    if blocked.is_empty() {
        return "no process reported as blocked".to_owned();
    }
    blocked
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
