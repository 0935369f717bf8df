//! Experiment orchestrator
//!
//! Sequences the measurement phases against the experiment plan: pings,
//! HTTP timings, then swarm fetches through each host group in turn. Each
//! phase runs to completion before the next one starts.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use shared::{component_debug, component_info, component_warn, logging, Component, ProcessState};

use crate::{
    command::DaemonCommand,
    config::ExperimentConfig,
    core::{aggregator, ConnectionManager, LatencyProbe, ProcessController, SamplingEngine},
    error::ExperimentResult,
    plan::ExperimentPlan,
    report::Report,
    traits::{DaemonCli, DaemonProcess, FileSystem, ProbeRunner},
};

/// Main orchestrator that drives one experiment
pub struct Orchestrator<C, P, R, F>
where
    C: DaemonCli + 'static,
    P: DaemonProcess + 'static,
    R: ProbeRunner + 'static,
    F: FileSystem + 'static,
{
    plan: ExperimentPlan,

    /// Injected services
    cli: Arc<C>,
    files: Arc<F>,

    /// Measurement engine
    controller: ProcessController<P>,
    connections: ConnectionManager<C>,
    sampler: SamplingEngine<C, F>,
    probe: LatencyProbe<R>,

    host_check_interval: Duration,
}

impl<C, P, R, F> Orchestrator<C, P, R, F>
where
    C: DaemonCli + 'static,
    P: DaemonProcess + 'static,
    R: ProbeRunner + 'static,
    F: FileSystem + 'static,
{
    /// Create new orchestrator with injected dependencies
    pub fn new(plan: ExperimentPlan, config: &ExperimentConfig, cli: C, process: P, runner: R, files: F) -> Self {
        let cli = Arc::new(cli);
        let files = Arc::new(files);

        Self {
            plan,
            connections: ConnectionManager::new(Arc::clone(&cli)),
            sampler: SamplingEngine::new(Arc::clone(&cli), Arc::clone(&files)),
            controller: ProcessController::new(process, config.lifecycle),
            probe: LatencyProbe::new(runner, config.probe),
            cli,
            files,
            host_check_interval: config.host_check_interval,
        }
    }

    pub fn plan(&self) -> &ExperimentPlan {
        &self.plan
    }

    pub fn daemon_state(&self) -> ProcessState {
        self.controller.state()
    }

    pub fn controller(&self) -> &ProcessController<P> {
        &self.controller
    }

    /// Create the daemon repository; an existing repository is fine
    pub async fn init_repo(&self) -> ExperimentResult<()> {
        match self.cli.run(&DaemonCommand::Init).await {
            Ok(_) => {
                component_info!(Component::Orchestrator, "Initialized daemon repository");
                Ok(())
            }
            Err(e) if e.is_transient() => {
                component_debug!(Component::Orchestrator, "Repository init skipped: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Run every measurement phase and return the report
    pub async fn measure(&mut self, include_slow: bool) -> ExperimentResult<Report> {
        let mut report = Report::new();
        let samples = self.plan.samples;
        logging::log_startup(Component::Orchestrator, &format!("experiment run {}", report.run_id));

        for group in &self.plan.ping_order {
            let pings = self.probe.ping_hosts(self.plan.hosts(group)).await?;
            report.pings.insert(group.clone(), pings);
        }

        let quick = self.plan.quick_file.clone();
        self.measure_curl(&mut report, &quick, samples.curl_quick).await?;
        self.controller.ensure_running().await?;
        self.measure_swarm(&mut report, &quick, samples.swarm_quick).await?;

        if include_slow {
            component_info!(Component::Orchestrator, "Running slow tests...");
            let slow = self.plan.slow_file.clone();
            self.measure_curl(&mut report, &slow, samples.curl_slow).await?;
            self.controller.ensure_running().await?;
            self.measure_swarm(&mut report, &slow, samples.swarm_slow).await?;
        }

        logging::log_success(Component::Orchestrator, "All measurement phases finished");
        Ok(report)
    }

    pub async fn write_report(&self, report: &Report) -> ExperimentResult<()> {
        component_info!(Component::Orchestrator, "Writing output...");
        self.files.write_report(report).await
    }

    /// Keep a pinned, long-running node up until `shutdown` fires
    pub async fn host(&mut self, shutdown: &mut mpsc::Receiver<()>) -> ExperimentResult<()> {
        self.controller.ensure_running().await?;

        for file in self.plan.files.values() {
            component_info!(Component::Orchestrator, "pinning {}...", file.hash());
            if let Err(e) = self.cli.run(&DaemonCommand::PinAdd(file.hash().clone())).await {
                if !e.is_transient() {
                    return Err(e);
                }
                component_warn!(Component::Orchestrator, "Failed to pin {}: {}", file.hash(), e);
            }
        }

        match self.cli.run(&DaemonCommand::Id).await {
            Ok(identity) => {
                println!("\nIMPORTANT: Please copy and send the following back to the experiment leader:");
                println!("{}", identity.trim_end());
            }
            Err(e) if e.is_transient() => {
                component_warn!(Component::Orchestrator, "Could not read node identity: {}", e);
            }
            Err(e) => return Err(e),
        }

        logging::log_success(Component::Orchestrator, "Host is running! Please do not close this shell.");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.host_check_interval) => {
                    self.controller.ensure_running().await?;
                }
                _ = shutdown.recv() => {
                    logging::log_shutdown(Component::Orchestrator, "host mode stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Stop the daemon; safe when nothing is running
    pub async fn shutdown(&mut self) -> ExperimentResult<()> {
        self.controller.shutdown().await
    }

    async fn measure_curl(&self, report: &mut Report, file_name: &str, samples: u32) -> ExperimentResult<()> {
        let Some(file) = self.plan.files.get(file_name) else {
            return Ok(());
        };
        let timings = self.probe.http_timing_samples(file.url(), samples).await?;
        report
            .curl
            .insert(file_name.to_string(), aggregator::reduce(&timings));
        Ok(())
    }

    async fn measure_swarm(&self, report: &mut Report, file_name: &str, samples: u32) -> ExperimentResult<()> {
        let Some(file) = self.plan.files.get(file_name) else {
            return Ok(());
        };

        for group in &self.plan.swarm_order {
            logging::log_progress(Component::Orchestrator, "Swarm fetch", &format!("{file_name} via {group} peers"));
            for node in self.plan.nodes_outside(group) {
                self.connections.ensure_disconnected(&node).await?;
            }

            let targets = self.plan.group_nodes(group);
            let set = self.sampler.collect(file, &targets, samples).await?;
            report.record_swarm(group, file_name, set);
        }
        Ok(())
    }
}
