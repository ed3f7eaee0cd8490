use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use storyteller_app::logging::{self, LogDestination};
use storyteller_app::{Cli, EffectRunner, JobMonitor, TerminalRenderer};
use storyteller_core::{JobPhase, MonitorView};
use storyteller_engine::ReqwestBackend;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(
        LogDestination::from_log_file(cli.log_file.as_deref()),
        logging::level_for(cli.verbose),
    );

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the job completed without a job-level error.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let backend = ReqwestBackend::new(cli.backend_settings())
        .with_context(|| format!("invalid API url {}", cli.api_url))?;
    let runner = EffectRunner::new(
        Arc::new(backend),
        cli.monitor_settings(),
        cli.output_dir.clone(),
    )
    .context("failed to start the monitor engine")?;

    let mut monitor = JobMonitor::new(runner);
    let mut renderer = TerminalRenderer::new();
    monitor.submit(cli.document.clone(), &cli.pages);

    let mut print = |view: &MonitorView| {
        for line in renderer.render(view) {
            println!("{line}");
        }
    };
    print(&monitor.view());
    // Polling has no ceiling; the run ends when the job settles.
    let outcome = monitor.run_until_settled(None, &mut print);
    let view = outcome.view().clone();
    print(&view);
    monitor.shutdown();

    Ok(view.phase == JobPhase::Completed && view.error.is_none())
}
