//! ezbcoin - interactive installer for bcoin, bcash and hsd nodes.
//!
//! # Execution Flow
//!
//! 1. Load `ezbcoin.yaml` and `EZBCOIN_*` overrides from the working directory
//! 2. Initialize logging → `logs/ezbcoin.<date>`
//! 3. Check that `git`, `npm` and `node` are usable
//! 4. Ask for the install path, prepare it and list what is already installed
//! 5. Ask the remaining questions
//! 6. On a tokio runtime: write configs, clone, install, launch, hand off to a shell
//!
//! Prompts run before the runtime exists. Ctrl-C during the async part cancels
//! a pending fetch, install or dashboard wait; once the shell is open it only
//! reaches the shell.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use ezbcoin::installer;
use ezbcoin::prompt::{self, DialoguerPrompter};
use ezbcoin::services::filesystem;
use ezbcoin::services::prereq;
use ezbcoin::services::process::banner;
use ezbcoin::services::{OsSecretGenerator, RelayRunner};
use ezbcoin::{APP_NAME, ConfigManager, InstallerSettings, VERSION};
use tokio::sync::watch;

fn main() -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let cwd = Utf8PathBuf::try_from(cwd).context("Working directory is not valid UTF-8")?;

    // Settings decide where logs go, so they load first
    let config_manager = ConfigManager::new(&cwd);
    let (settings, source) = config_manager.load_settings()?;
    let _log_guard = ezbcoin::logging::init_logging(&cwd.join(&settings.log_dir), settings.debug_mode)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    config_manager.log_source(source);

    let result = run(&cwd, &settings);
    if let Err(e) = &result {
        tracing::error!("Installer failed: {:#}", e);
    }
    result
}

fn run(cwd: &Utf8Path, settings: &InstallerSettings) -> Result<()> {
    println!("{}", banner("Welcome to EZ bcoin installer!"));

    prereq::check_prerequisites().context("Prerequisite check failed")?;

    let prompter = DialoguerPrompter;
    let builder = prompt::ask_path(&prompter, cwd)?;
    let root = builder
        .path()
        .cloned()
        .ok_or_else(|| anyhow!("No install path was given"))?;

    let (layout, prepared) = filesystem::prepare_root(&root)?;
    tracing::info!(
        "Install root {} ready ({} directories created)",
        layout.root(),
        prepared.created.len()
    );

    let installed = filesystem::list_installed(&layout.libs_dir())?;
    if installed.is_empty() {
        println!("Nothing installed in {} yet", layout.libs_dir());
    } else {
        let names: Vec<&str> = installed.iter().map(String::as_str).collect();
        println!("Already installed: {}", names.join(", "));
    }

    let options = prompt::ask_rest(&prompter, builder, &installed)?;
    tracing::info!("Installing into {}", options.path);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("ezbcoin-worker")
        .build()?;

    let result = runtime.block_on(async {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received");
                let _ = cancel_tx.send(true);
            }
        });

        installer::run(
            &RelayRunner,
            &OsSecretGenerator,
            settings,
            &layout,
            &options,
            &installed,
            cancel_rx,
        )
        .await
    });

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    tracing::info!("Installer finished");
    result
}
