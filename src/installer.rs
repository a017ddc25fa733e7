//! Drives one installer run from survey answers to the handoff shell.

use crate::models::{InstallLayout, InstallerSettings, Options, required_projects};
use crate::services::derivation::{DerivedConfigs, SecretGenerator, derive_configs};
use crate::services::filesystem;
use crate::services::handoff::{self, FAREWELL};
use crate::services::launch::{self, DashboardWait, RunningDashboard};
use crate::services::materialize::{self, MaterializedFiles};
use crate::services::pipeline::{self, StageReport};
use crate::services::process::{CommandRunner, banner};
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeSet;
use std::future::{Future, pending};
use tokio::sync::watch;

/// Directories and files written before anything is fetched.
#[derive(Debug, Clone)]
pub struct Configured {
    pub configs: DerivedConfigs,
    pub files: MaterializedFiles,
}

/// Fetch and install stage results.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub fetch: StageReport,
    pub install: StageReport,
}

/// Create the run's data directories, derive every option set and write it out.
pub fn configure(
    layout: &InstallLayout,
    options: &Options,
    installed: &BTreeSet<String>,
    secrets: &impl SecretGenerator,
) -> Result<Configured> {
    filesystem::prepare_run_dirs(layout, options)?;
    println!("{}", banner("Writing configuration files..."));

    let wallet_prefix = layout.library_data_dir(options.library);
    let configs = derive_configs(options, installed, wallet_prefix.as_str(), secrets);
    if configs.conflict {
        println!(
            "{} is already installed next to {}, using alternate ports",
            options.library.sibling().map(|lib| lib.name()).unwrap_or_default(),
            options.library
        );
    }

    let files = materialize::materialize(layout, options, &configs)?;
    Ok(Configured { configs, files })
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Nobody can cancel anymore
            pending::<()>().await;
        }
    }
}

/// Race `work` against a cancellation request.
async fn cancellable<T>(
    work: impl Future<Output = T>,
    cancel: &mut watch::Receiver<bool>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = wait_for_cancel(cancel) => {
            tracing::warn!("Installation cancelled during fetch/install");
            Err(anyhow!("Installation cancelled by user"))
        }
        out = work => Ok(out),
    }
}

/// Clone what's missing, then install dependencies for what was cloned.
pub async fn fetch_and_install<R: CommandRunner>(
    runner: &R,
    settings: &InstallerSettings,
    layout: &InstallLayout,
    options: &Options,
    installed: &BTreeSet<String>,
    cancel: &mut watch::Receiver<bool>,
) -> Result<Fetched> {
    let required = required_projects(options);

    let fetch = cancellable(
        pipeline::fetch_projects(
            runner,
            layout,
            &required,
            installed,
            &settings.revisions,
            settings.fetch_policy,
        ),
        cancel,
    )
    .await?
    .context("Fetch stage failed")?;

    let install = cancellable(
        pipeline::install_projects(runner, layout, &fetch.processed, settings.install_policy),
        cancel,
    )
    .await?
    .context("Dependency install failed")?;

    Ok(Fetched { fetch, install })
}

/// Start the node (and bmultisig), then the dashboard if chosen.
pub async fn launch(
    settings: &InstallerSettings,
    layout: &InstallLayout,
    options: &Options,
    configs: &DerivedConfigs,
    cancel: &mut watch::Receiver<bool>,
) -> Result<Option<RunningDashboard>> {
    launch::launch_node(layout, options, configs).context("Failed to start node")?;

    if !options.dashboard {
        return Ok(None);
    }

    let wait = DashboardWait {
        timeout: settings.readiness_timeout(),
        echo_width: settings.echo_width,
        verbose: settings.debug_mode,
    };
    let dashboard = launch::launch_dashboard(layout, wait, cancel)
        .await
        .context("bPanel did not start")?;
    Ok(Some(dashboard))
}

/// Print usage and hold the operator in a shell until they exit it.
///
/// Variables are offered for whatever is installed now, which includes
/// projects from earlier runs.
pub async fn hand_off(settings: &InstallerSettings, layout: &InstallLayout, options: &Options) -> Result<()> {
    let installed = filesystem::list_installed(&layout.libs_dir())?;
    let env = handoff::handoff_env(layout, &installed, options.network);

    let dashboard_url = options.dashboard.then_some(settings.dashboard_url.as_str());
    println!("{}", handoff::usage_text(&env, dashboard_url));

    if settings.debug_mode {
        tracing::info!("Debug mode, skipping the handoff shell");
        return Ok(());
    }

    handoff::open_shell(&settings.shell, layout.root(), &env).await?;
    println!("{}", FAREWELL);
    Ok(())
}

/// Everything after the survey.
pub async fn run<R: CommandRunner>(
    runner: &R,
    secrets: &impl SecretGenerator,
    settings: &InstallerSettings,
    layout: &InstallLayout,
    options: &Options,
    installed: &BTreeSet<String>,
    mut cancel: watch::Receiver<bool>,
) -> Result<()> {
    let configured = configure(layout, options, installed, secrets)?;
    tracing::info!("Wrote {} config files", configured.files.written.len());

    let fetched = fetch_and_install(runner, settings, layout, options, installed, &mut cancel).await?;
    let failures = fetched.fetch.failures().count() + fetched.install.failures().count();
    if failures > 0 {
        tracing::warn!("{} fetch/install steps failed and were skipped", failures);
    }

    // Held so its output keeps draining while the shell runs
    let _dashboard = launch(settings, layout, options, &configured.configs, &mut cancel).await?;

    hand_off(settings, layout, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancellable_passes_through() {
        let (_tx, mut rx) = watch::channel(false);
        assert_eq!(cancellable(async { 7 }, &mut rx).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancellable_stops_on_request() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        let result = cancellable(pending::<()>(), &mut rx).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dropped_sender_does_not_cancel() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        assert_eq!(cancellable(async { "done" }, &mut rx).await.unwrap(), "done");
    }
}
