use std::process::ExitCode;

use anyhow::Context;
use echoscan_core::control::RunControl;
use echoscan_core::prober::IcmpProber;
use echoscan_core::report;
use echoscan_core::resolver::SystemResolver;
use echoscan_core::scheduler::ProbeScheduler;
use echoscan_core::targets;
use tracing::{debug, warn};

use crate::commands::CommandLine;
use crate::terminal::print::{self, ConsoleReporter};

const EXIT_NO_REPLY: u8 = 1;

pub async fn ping(commands: &CommandLine) -> anyhow::Result<ExitCode> {
    let probe_options = commands.probe_options()?;
    let run_config = commands.run_config();
    let target_options = commands.target_options();

    let resolver = SystemResolver::new();
    let targets =
        targets::build_target_set(&commands.targets, &commands.exclude, &resolver, &target_options).await?;
    print::line(report::total_targets_line(targets.len()));

    let control = RunControl::new();
    listen_for_signals(&control);

    let scheduler = ProbeScheduler::new(targets, IcmpProber::new(), ConsoleReporter::new(), control)
        .with_probe_options(probe_options)
        .with_run_config(run_config)
        .with_reverse_resolver(resolver);

    let summary = tokio::task::spawn_blocking(move || scheduler.run())
        .await
        .context("probe scheduler stopped unexpectedly")?;

    print::summary(&summary);

    if summary.any_reply() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_NO_REPLY))
    }
}

/// Ctrl+C stops the run. On Unix, SIGQUIT (Ctrl+\) prints interim totals.
fn listen_for_signals(control: &RunControl) {
    let on_interrupt = control.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, stopping");
            on_interrupt.stop();
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let on_quit = control.clone();
        tokio::spawn(async move {
            let mut quit = match signal(SignalKind::quit()) {
                Ok(quit) => quit,
                Err(e) => {
                    warn!("Interim statistics on SIGQUIT unavailable: {e}");
                    return;
                }
            };
            while quit.recv().await.is_some() {
                on_quit.request_snapshot();
            }
        });
    }
}
