use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lamport_clock_simulator::abstractions::logging::ScopedEventLogger;
use lamport_clock_simulator::{Script, Simulator, SimulatorConfig};

const EVENT_BUFFER: usize = 1024;

#[derive(Parser)]
#[command(name = "lamport-sim")]
#[command(about = "Simulate concurrent processes under Lamport logical clocks")]
#[command(version)]
struct Cli {
    /// Path to the process script, one line per process, e.g.
    /// `p0: s1 r1 l r1`
    #[arg(short, long)]
    input: PathBuf,

    /// Write the history here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Cancel the run if processes have not finished after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Messages buffered per (sender, receiver) channel
    #[arg(long)]
    capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let mut config = SimulatorConfig::from_env().context("invalid simulator configuration")?;
    if let Some(capacity) = cli.capacity {
        config = config.with_channel_capacity(capacity)?;
    }
    if let Some(millis) = cli.timeout_ms {
        config = config.with_liveness_timeout(Duration::from_millis(millis));
    }

    let script = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("failed to read script {}", cli.input.display()))?;

    let script: Script = script
        .parse()
        .with_context(|| format!("invalid script {}", cli.input.display()))?;

    let run_id = Simulator::new_run_id();
    let (observer, event_receiver) = broadcast::channel(EVENT_BUFFER);
    let logger = ScopedEventLogger::new(run_id, event_receiver).start();

    let simulator = Simulator::new(config).with_observer(observer);
    let result = simulator.run_script_with_id(run_id, &script).await;
    drop(simulator);
    let logged = logger.await.context("event logger failed")?;

    let history = result.context("simulation failed")?;
    info!(run_id = %history.run_id(), logged, "simulation complete");

    match cli.output {
        Some(path) => {
            tokio::fs::write(&path, history.to_string())
                .await
                .with_context(|| format!("failed to write history to {}", path.display()))?;
            info!(path = %path.display(), "history written");
        }
        None => print!("{history}"),
    }

    Ok(())
}
