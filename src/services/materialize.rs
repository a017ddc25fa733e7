//! Writes derived option sets to the files the downstream projects read.

use crate::models::{InstallLayout, Network, OptionSet, Options, WalletMode};
use crate::services::derivation::DerivedConfigs;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Plugins every bPanel install starts with, in load order.
pub const BASE_DASHBOARD_PLUGINS: &[&str] = &[
    "@bpanel/genesis-theme",
    "@bpanel/price-widget",
    "@bpanel/peers-widget",
    "@bpanel/recent-blocks",
    "@bpanel/connection-manager",
];

pub const MINER_PLUGIN: &str = "@bpanel/simple-mining";
pub const WALLET_PLUGIN: &str = "@bpanel/bwallet";

/// Render an option set as `kebab-key: value` lines.
pub fn to_config_string(options: &OptionSet) -> String {
    let mut output = String::new();
    for (key, value) in options.iter() {
        output.push_str(&key.replace('_', "-"));
        output.push_str(": ");
        output.push_str(&value.to_string());
        output.push('\n');
    }
    output
}

/// Write an option set to `path`, replacing any existing file.
pub fn write_config_file(path: &Utf8Path, options: &OptionSet) -> Result<()> {
    fs::write(path, to_config_string(options))
        .with_context(|| format!("Failed to write config: {}", path))?;
    tracing::info!("Wrote {} keys to {}", options.len(), path);
    Ok(())
}

/// Plugin list for bPanel's `config.js`.
pub fn dashboard_plugins(network: Network, wallet: WalletMode) -> Vec<&'static str> {
    let mut plugins = BASE_DASHBOARD_PLUGINS.to_vec();
    if network.is_local() {
        plugins.push(MINER_PLUGIN);
    }
    if wallet.has_wallet() {
        plugins.push(WALLET_PLUGIN);
    }
    plugins
}

/// bPanel's aggregate config, as a CommonJS module assignment.
pub fn dashboard_config_js(network: Network, wallet: WalletMode) -> String {
    let plugins = dashboard_plugins(network, wallet)
        .iter()
        .map(|plugin| format!("\"{}\"", plugin))
        .collect::<Vec<_>>()
        .join(",");
    format!("module.exports = {{plugins:[{}],localPlugins:[]}}", plugins)
}

/// Paths written by [`materialize`].
#[derive(Debug, Clone, Default)]
pub struct MaterializedFiles {
    pub written: Vec<Utf8PathBuf>,
}

/// Write every config file of a run.
///
/// Directories must already exist; see
/// [`prepare_run_dirs`](crate::services::filesystem::prepare_run_dirs).
/// Existing files are overwritten.
///
/// # Arguments
/// * `layout` - Install layout the files are placed in
/// * `options` - Survey answers selecting library, network and wallet
/// * `configs` - Sets from [`derive_configs`](crate::services::derive_configs)
///
/// # Returns
/// Every path written, daemon config first
pub fn materialize(
    layout: &InstallLayout,
    options: &Options,
    configs: &DerivedConfigs,
) -> Result<MaterializedFiles> {
    let mut files = MaterializedFiles::default();

    let daemon_conf = layout.library_conf(options.library);
    write_config_file(&daemon_conf, &configs.daemon_file_options())?;
    files.written.push(daemon_conf);

    let wallet_conf = layout.wallet_conf(options.library, options.network);
    write_config_file(&wallet_conf, &configs.wallet)?;
    files.written.push(wallet_conf);

    // bPanel client config and plugin list
    if let Some(dashboard) = &configs.dashboard {
        let client_conf = layout.dashboard_client_conf(options.library);
        write_config_file(&client_conf, dashboard)?;
        files.written.push(client_conf);

        let config_js = layout.dashboard_config_js();
        fs::write(&config_js, dashboard_config_js(options.network, options.wallet))
            .with_context(|| format!("Failed to write dashboard config: {}", config_js))?;
        tracing::info!("Wrote dashboard plugin list to {}", config_js);
        files.written.push(config_js);
    }

    Ok(files)
}
