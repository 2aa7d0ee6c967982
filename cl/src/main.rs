//! Cascade Lifecycle - simulator entry point

use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use cascade_lifecycle::cli::{Cli, Command};
use cascade_lifecycle::{Config, LifecycleState, Simulation};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install subscriber: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn paint(state: LifecycleState) -> ColoredString {
    match state {
        LifecycleState::Active => state.as_str().green(),
        LifecycleState::Inactive => state.as_str().yellow(),
        LifecycleState::Unconfigured => state.as_str().dimmed(),
        LifecycleState::Finalized => state.as_str().red(),
        LifecycleState::Unknown => state.as_str().normal(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Simulate {
            duration_ms,
            crash,
            crash_after_ms,
        } => cmd_simulate(config, duration_ms, crash, crash_after_ms).await,
        Command::Validate => cmd_validate(&config),
    }
}

fn cmd_validate(config: &Config) -> Result<()> {
    config.validate()?;
    let roots = config.graph.roots();
    println!(
        "{} {} nodes, {} activation edges",
        "✓".green(),
        config.graph.nodes.len(),
        config.graph.edge_count()
    );
    if !roots.is_empty() {
        println!("  Roots: {}", roots.join(", ").cyan());
    }
    Ok(())
}

async fn cmd_simulate(config: Config, duration_ms: u64, crash: Option<String>, crash_after_ms: u64) -> Result<()> {
    if config.graph.nodes.is_empty() {
        return Err(eyre!("No nodes configured; add a graph section to the config"));
    }

    let mut sim = Simulation::spawn(config).context("Failed to spawn simulation")?;
    let mut states_rx = sim.bus().subscribe_states();

    sim.wire().await?;
    sim.start_roots().await?;

    let deadline = tokio::time::sleep(Duration::from_millis(duration_ms));
    tokio::pin!(deadline);
    let crash_timer = tokio::time::sleep(Duration::from_millis(crash_after_ms));
    tokio::pin!(crash_timer);
    let mut pending_crash = crash;

    // Heartbeats repeat the same state; only print changes
    let mut last_seen: HashMap<String, LifecycleState> = HashMap::new();

    loop {
        tokio::select! {
            msg = states_rx.recv() => match msg {
                Ok(msg) => {
                    if last_seen.insert(msg.node.clone(), msg.state) != Some(msg.state) {
                        println!("{:>16} → {}", msg.node.cyan(), paint(msg.state));
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "State printer lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut crash_timer, if pending_crash.is_some() => {
                if let Some(node) = pending_crash.take() {
                    if sim.crash(&node) {
                        println!("{:>16} ✗ {}", node.cyan(), "crashed".red().bold());
                    } else {
                        warn!(%node, "Cannot crash unknown node");
                    }
                }
            }
            _ = &mut deadline => break,
        }
    }

    println!();
    println!("{}", "Final states".bold());
    for (node, state) in sim.states().await {
        println!("{:>16}   {}", node.cyan(), paint(state));
    }

    sim.shutdown().await;
    Ok(())
}
