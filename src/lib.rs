//! Concurrent process simulator with Lamport logical clocks.
//!
//! A script describes a fixed set of processes, each a sequence of local,
//! send and receive operations. Every process runs as its own task, messages
//! travel over bounded per-pair FIFO channels, and every event is stamped
//! with the process's Lamport clock. The result is a [`History`] of per-process
//! event logs.
//!
//! ```no_run
//! # async fn demo() -> Result<(), lamport_clock_simulator::SimulationError> {
//! use lamport_clock_simulator::Simulator;
//!
//! let history = Simulator::default()
//!     .run("p0: s1 l\np1: r0 l")
//!     .await?;
//! assert_eq!(history.timestamps(1), vec![2, 3]);
//! # Ok(())
//! # }
//! ```

pub mod abstractions;
pub mod config;
pub mod error;
pub mod history;
pub mod script;
pub mod simulator;

pub use abstractions::process::Operation;
pub use abstractions::{Event, EventKind, Message, ProcessId, Timestamp};
pub use config::SimulatorConfig;
pub use error::{ConfigError, LinkError, ProcessError, ScriptError, SimulationError};
pub use history::{CausalLink, History};
pub use script::Script;
pub use simulator::Simulator;
