//! Starting the node daemon, the multisig wallet and the dashboard.

use crate::models::{InstallLayout, Options, WalletMode};
use crate::models::project::{BMULTISIG, BPANEL};
use crate::services::derivation::DerivedConfigs;
use crate::services::process::{self, CommandSpec, ProcessError, banner};
use crate::services::readiness::{self, ReadinessError, ReadinessProbe};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),
}

fn prefix_flag(path: impl std::fmt::Display) -> String {
    format!("--prefix={}", path)
}

/// Flags for the node daemon.
///
/// The built-in wallet only loads in `bwallet` mode; bmultisig brings its own.
pub fn daemon_args(layout: &InstallLayout, options: &Options, spv: bool) -> Vec<String> {
    let mut args = vec![
        "--daemon".to_string(),
        prefix_flag(layout.library_data_dir(options.library)),
    ];
    if spv {
        args.push("--spv".to_string());
    }
    if options.wallet != WalletMode::Bwallet {
        args.push("--no-wallet".to_string());
    }
    args
}

pub fn daemon_command(layout: &InstallLayout, options: &Options, configs: &DerivedConfigs) -> CommandSpec {
    let library = options.library;
    CommandSpec::new(
        format!("start {}", library),
        format!("./{}", library.name()),
        &layout.project_dir(library.name()).join("bin"),
    )
    .args(daemon_args(layout, options, configs.spv()))
}

pub fn multisig_command(layout: &InstallLayout, options: &Options) -> CommandSpec {
    CommandSpec::new(
        "start bmultisig",
        format!("./{}", BMULTISIG.dir),
        &layout.project_dir(BMULTISIG.dir).join("bin"),
    )
    .arg(prefix_flag(layout.wallet_dir(options.library, options.network)))
}

pub fn dashboard_command(layout: &InstallLayout) -> CommandSpec {
    CommandSpec::new("start bpanel", "npm", &layout.project_dir(BPANEL.dir)).args([
        "run".to_string(),
        "start:poll".to_string(),
        "--".to_string(),
        prefix_flag(layout.dashboard_data_dir()),
    ])
}

/// Start the daemon and, in bmultisig mode, the multisig wallet. Both are
/// detached and outlive the installer.
pub fn launch_node(
    layout: &InstallLayout,
    options: &Options,
    configs: &DerivedConfigs,
) -> Result<Vec<Option<u32>>, ProcessError> {
    println!("{}", banner(&format!("Running: {}...", options.library)));
    tracing::info!("Starting {} on {}", options.library, options.network);
    let mut pids = vec![process::spawn_detached(&daemon_command(layout, options, configs))?];

    if options.wallet == WalletMode::Multisig {
        println!("{}", banner("Running: bmultisig..."));
        pids.push(process::spawn_detached(&multisig_command(layout, options))?);
    }

    Ok(pids)
}

/// Readiness wait knobs, taken from installer settings.
#[derive(Debug, Clone, Copy)]
pub struct DashboardWait {
    pub timeout: Option<Duration>,
    pub echo_width: usize,
    pub verbose: bool,
}

/// A dashboard that reported readiness.
///
/// Its output keeps draining in the background for as long as this handle
/// and the runtime live.
#[derive(Debug)]
pub struct RunningDashboard {
    pub child: Child,
    pub drain: JoinHandle<()>,
}

/// Start bPanel and block until it prints its readiness marker.
///
/// Marker and status lines are echoed while waiting; after readiness the
/// rest of the output is drained in the background.
///
/// # Arguments
/// * `layout` - Install layout holding the bPanel checkout and data directory
/// * `wait` - Timeout and echo settings for the readiness wait
/// * `cancel` - Set to `true` to stop waiting
///
/// # Returns
/// The running dashboard, or why it never became ready. The child is not
/// killed on error.
pub async fn launch_dashboard(
    layout: &InstallLayout,
    wait: DashboardWait,
    cancel: &mut watch::Receiver<bool>,
) -> Result<RunningDashboard, LaunchError> {
    println!("{}", banner("Running: bPanel..."));
    println!("This can take a while on first build");
    let (child, mut lines) = process::spawn_with_lines(&dashboard_command(layout))?;

    let mut probe = ReadinessProbe::new(wait.echo_width, wait.verbose);
    readiness::wait_for_ready(&mut probe, &mut lines, wait.timeout, cancel, |line| {
        println!("{}", line)
    })
    .await?;

    // Keep the pipe open so bPanel never blocks on a full buffer
    let drain = readiness::drain_to_log(lines, wait.verbose);
    Ok(RunningDashboard { child, drain })
}
