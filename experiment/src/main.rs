//! Main entry point for the experiment binary
//!
//! Wires the real services into the orchestrator and runs one of three
//! modes: measure (default), host a long-running node, or kill the node.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;

use experiment::{
    services::{RealDaemonCli, RealDaemonProcess, RealFileSystem, RealProbeRunner},
    ExperimentConfig, ExperimentPlan, Orchestrator,
};
use shared::{logging, Component};

/// Measures ping, HTTP and swarm fetch latency against the experiment's peers
#[derive(Parser)]
#[command(name = "experiment")]
#[command(about = "Experiments. Please contact the sender for questions.")]
pub struct Args {
    /// Host a long-running node for the experiment in the background
    #[arg(long, conflicts_with = "kill")]
    pub host: bool,

    /// Kill the background node
    #[arg(long)]
    pub kill: bool,

    /// Test both large and small files
    #[arg(short, long)]
    pub all: bool,

    /// /path/to/.ipfs/ (defaults to IPFS_PATH, then go-ipfs/.ipfs)
    #[arg(short = 'd', long)]
    pub dotipfs: Option<PathBuf>,

    /// Daemon binary (defaults to IPFS_BINARY, then go-ipfs/ipfs)
    #[arg(long)]
    pub ipfs_binary: Option<PathBuf>,

    /// JSON experiment plan replacing the built-in one
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Report destination
    #[arg(short, long, default_value = "out.json")]
    pub output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Give up if the daemon is not available after this many seconds (default: wait forever)
    #[arg(long)]
    pub start_timeout: Option<u64>,

    /// Give up if the daemon has not exited after this many seconds (default: wait forever)
    #[arg(long)]
    pub stop_timeout: Option<u64>,

    /// Echo requests per ping
    #[arg(long, default_value = "10")]
    pub ping_count: u32,

    /// Upper bound of the random delay before each probe, in milliseconds
    #[arg(long, default_value = "2000")]
    pub max_jitter_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    if cfg!(windows) {
        anyhow::bail!("Windows is not supported");
    }

    let config = ExperimentConfig::from_env()
        .with_binary(args.ipfs_binary.clone())
        .with_repo_path(args.dotipfs.clone())
        .with_output(args.output.clone())
        .with_timeouts(args.start_timeout, args.stop_timeout)
        .with_probe(args.ping_count, Duration::from_millis(args.max_jitter_ms));
    config.validate()?;

    let plan = match &args.plan {
        Some(path) => ExperimentPlan::load(path).with_context(|| format!("loading plan {}", path.display()))?,
        None => ExperimentPlan::builtin()?,
    };

    // Initialize services
    let cli = RealDaemonCli::new(config.ipfs_binary.clone(), config.repo_path.clone())
        .with_work_dir(config.work_dir.clone());
    let process = RealDaemonProcess::new(cli.clone());
    let file_system = RealFileSystem::new(config.work_dir.clone(), config.output.clone());

    // Create orchestrator with dependency injection
    let mut orchestrator = Orchestrator::new(plan, &config, cli, process, RealProbeRunner::new(), file_system);

    // Set up graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(Component::Orchestrator, "Received Ctrl+C signal");
                let _ = shutdown_tx.send(()).await;
            }
            Err(err) => {
                logging::log_error(Component::Orchestrator, "Signal handling", &err);
            }
        }
    });

    let outcome = if args.kill {
        Ok(())
    } else {
        orchestrator.init_repo().await?;
        if args.host {
            logging::log_startup(Component::Orchestrator, "host mode");
            orchestrator.host(&mut shutdown_rx).await
        } else {
            logging::log_startup(
                Component::Orchestrator,
                "measurements. Please remain connected to the internet, and refrain from streaming videos",
            );
            tokio::select! {
                result = orchestrator.measure(args.all) => match result {
                    Ok(report) => orchestrator.write_report(&report).await.map(|_| {
                        logging::log_success(
                            Component::Orchestrator,
                            &format!("Please send {} back to the sender :)", config.output.display()),
                        );
                    }),
                    Err(e) => Err(e),
                },
                _ = shutdown_rx.recv() => Ok(()),
            }
        }
    };

    if let Err(e) = &outcome {
        logging::log_error(Component::Orchestrator, "Experiment", e);
    }

    orchestrator.shutdown().await?;
    logging::log_success(Component::Orchestrator, "Daemon stopped");
    Ok(outcome?)
}
