//! Operator handoff: usage text and an interactive shell with CLI shortcuts.

use crate::models::project::{BPANEL_CLI, BPANEL};
use crate::models::{InstallLayout, Library, Network};
use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::process::ExitStatus;
use tokio::process::Command;

pub const FAREWELL: &str = "Bye! Thanks for using EZ installer!";

/// Every variable the handoff shell can carry, in the order they are listed.
pub const ENV_VARS: &[&str] = &[
    "BCOINCLI",
    "BCASHCLI",
    "HSDCLI",
    "BCOINWALLET",
    "BCASHWALLET",
    "HSDWALLET",
    "BPANELCLI",
];

/// Node and wallet CLI locations inside an installed library.
fn client_bins(library: Library) -> (&'static str, &'static str) {
    match library {
        Library::Bcoin | Library::Bcash => (
            "node_modules/bclient/bin/bcoin-cli",
            "node_modules/bclient/bin/bwallet-cli",
        ),
        Library::Hsd => (
            "node_modules/hs-client/bin/hsd-cli",
            "node_modules/hs-client/bin/hsw-cli",
        ),
    }
}

fn with_prefix(command: impl std::fmt::Display, prefix: &Utf8Path) -> String {
    format!("{} --prefix={}", command, prefix)
}

/// Shortcut variables for every installed project.
///
/// Wallet shortcuts point at the wallet directory of `network` for their own
/// library.
pub fn handoff_env(
    layout: &InstallLayout,
    installed: &BTreeSet<String>,
    network: Network,
) -> IndexMap<String, String> {
    let mut node_vars = IndexMap::new();
    let mut wallet_vars = IndexMap::new();

    for library in Library::ALL {
        if !installed.contains(library.name()) {
            continue;
        }
        let upper = library.name().to_uppercase();
        let (node_cli, wallet_cli) = client_bins(library);
        let project_dir = layout.project_dir(library.name());

        node_vars.insert(
            format!("{}CLI", upper),
            with_prefix(project_dir.join(node_cli), &layout.library_data_dir(library)),
        );
        wallet_vars.insert(
            format!("{}WALLET", upper),
            with_prefix(project_dir.join(wallet_cli), &layout.wallet_dir(library, network)),
        );
    }

    let mut env = node_vars;
    env.extend(wallet_vars);

    if installed.contains(BPANEL_CLI.dir) {
        let program = layout.project_dir(BPANEL_CLI.dir).join("dist/program.js");
        env.insert(
            "BPANELCLI".to_string(),
            with_prefix(format!("node {}", program), &layout.dashboard_data_dir()),
        );
    }

    env
}

/// Text printed before the shell starts.
pub fn usage_text(env: &IndexMap<String, String>, dashboard_url: Option<&str>) -> String {
    let mut text = String::from("\n***\n");

    if let Some(url) = dashboard_url {
        text.push_str(&format!(
            "Okay! bPanel is just about ready.\n\
             Go to {} in your browser.\n\
             You may need to reload the page a few times in the next minute while\n\
             the last plugins render.\n\n",
            url
        ));
    }

    text.push_str("This shell has these environment variables set:\n");
    for name in env.keys() {
        text.push_str(&format!("  ${}\n", name));
    }
    text.push_str("  exit\n\nexamples:\n\n");

    if env.contains_key("BPANELCLI") {
        text.push_str("(list all bpanel plugins)\n$BPANELCLI l\n\n");
    }
    if let Some(node_var) = env.keys().find(|name| name.ends_with("CLI") && *name != "BPANELCLI") {
        text.push_str(&format!("(stop the node server)\n${} rpc stop\n\n", node_var));
    }
    if env.contains_key("BPANELCLI") || dashboard_url.is_some() {
        text.push_str(&format!("(stop bpanel server)\nkillall {}\n\n", BPANEL.dir));
    }

    text.push_str(
        "You can reconfigure a client by stopping it first and running this installer again.\n***\n",
    );
    text
}

/// The handoff command: `shell` in `cwd`, with `env` layered over the
/// installer's own environment so `PATH` and friends survive.
pub fn shell_command(shell: &str, cwd: &Utf8Path, env: &IndexMap<String, String>) -> Command {
    let mut command = Command::new(shell);
    command.current_dir(cwd).envs(env);
    command
}

/// Run `shell` interactively with `env` added to the current environment.
///
/// Standard streams are inherited, so the operator talks to the shell
/// directly.
///
/// # Arguments
/// * `shell` - Program to run, usually `bash`
/// * `cwd` - Directory the shell starts in, the install root
/// * `env` - Shortcut variables from [`handoff_env`]
///
/// # Returns
/// The shell's exit status once the operator leaves it
pub async fn open_shell(shell: &str, cwd: &Utf8Path, env: &IndexMap<String, String>) -> Result<ExitStatus> {
    tracing::info!("Handing off to {} with {} shortcut variables", shell, env.len());

    let status = shell_command(shell, cwd, env)
        .status()
        .await
        .with_context(|| format!("Failed to start shell `{}`", shell))?;

    tracing::info!("Shell exited with {}", status);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_only_installed_projects_get_variables() {
        let layout = InstallLayout::new("/opt/ez");
        let env = handoff_env(&layout, &installed(&["bcoin", "bmultisig"]), Network::Regtest);

        assert_eq!(env.keys().collect::<Vec<_>>(), vec!["BCOINCLI", "BCOINWALLET"]);
        assert_eq!(
            env["BCOINCLI"],
            "/opt/ez/libs/bcoin/node_modules/bclient/bin/bcoin-cli --prefix=/opt/ez/data/bcoin"
        );
        assert_eq!(
            env["BCOINWALLET"],
            "/opt/ez/libs/bcoin/node_modules/bclient/bin/bwallet-cli --prefix=/opt/ez/data/bcoin/regtest"
        );
    }

    #[test]
    fn test_hsd_and_bpanel_cli() {
        let layout = InstallLayout::new("/opt/ez");
        let env = handoff_env(&layout, &installed(&["hsd", "bpanel", "bpanel-cli"]), Network::Main);

        assert_eq!(
            env["HSDWALLET"],
            "/opt/ez/libs/hsd/node_modules/hs-client/bin/hsw-cli --prefix=/opt/ez/data/hsd"
        );
        assert_eq!(
            env["BPANELCLI"],
            "node /opt/ez/libs/bpanel-cli/dist/program.js --prefix=/opt/ez/data/bpanel"
        );
    }

    #[test]
    fn test_variable_order_follows_listing() {
        let layout = InstallLayout::new("/opt/ez");
        let env = handoff_env(
            &layout,
            &installed(&["bcash", "bcoin", "bpanel-cli", "hsd"]),
            Network::Main,
        );
        let names: Vec<_> = env.keys().map(String::as_str).collect();
        assert_eq!(names, ENV_VARS);
    }

    #[test]
    fn test_usage_text_lists_variables() {
        let layout = InstallLayout::new("/opt/ez");
        let env = handoff_env(&layout, &installed(&["bcoin", "bpanel-cli"]), Network::Main);
        let text = usage_text(&env, Some("http://localhost:5000"));

        assert!(text.contains("Go to http://localhost:5000"));
        assert!(text.contains("  $BCOINCLI\n"));
        assert!(text.contains("$BPANELCLI l"));
        assert!(text.contains("$BCOINCLI rpc stop"));
    }

    #[test]
    fn test_usage_text_without_dashboard() {
        let text = usage_text(&IndexMap::new(), None);
        assert!(!text.contains("bPanel is just about ready"));
        assert!(!text.contains("killall"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_keeps_path_and_adds_shortcuts() {
        let layout = InstallLayout::new("/opt/ez");
        let env = handoff_env(&layout, &installed(&["bcoin"]), Network::Main);

        let output = shell_command("env", Utf8Path::new("/"), &env)
            .output()
            .await
            .unwrap();
        let printed = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success());
        assert!(printed.lines().any(|line| line.starts_with("PATH=")));
        assert!(printed.lines().any(|line| line
            == "BCOINCLI=/opt/ez/libs/bcoin/node_modules/bclient/bin/bcoin-cli --prefix=/opt/ez/data/bcoin"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_shell_returns_exit_status() {
        let status = open_shell("true", Utf8Path::new("/"), &IndexMap::new())
            .await
            .unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_open_shell_missing_program() {
        let result = open_shell("ezbcoin-definitely-missing", Utf8Path::new("/"), &IndexMap::new()).await;
        assert!(result.is_err());
    }
}
