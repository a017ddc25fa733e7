//! Configuration derivation: survey answers plus the installed-library set in,
//! one [`OptionSet`] per target process out.

use crate::models::{Library, Network, NodeMode, OptionSet, Options, WalletMode};
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::BTreeSet;

/// Number of random bytes in every generated API key and token.
pub const SECRET_BYTES: usize = 32;

/// Daemon keys the node's own config parser doesn't know. They are kept in
/// the derived set for bookkeeping and stripped before the file is written.
pub const INTERNAL_DAEMON_KEYS: &[&str] = &["spv"];

/// Source of API keys and admin tokens.
#[cfg_attr(test, mockall::automock)]
pub trait SecretGenerator {
    /// A fresh hex-encoded secret.
    fn generate(&self) -> String;
}

/// Draws [`SECRET_BYTES`] from the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSecretGenerator;

impl SecretGenerator for OsSecretGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Ports that replace the defaults when bcoin and bcash share a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAssignment {
    pub p2p: u16,
    pub public: u16,
    pub node_http: u16,
    pub wallet_http: u16,
}

/// Fixed alternate ports for the second of two sibling libraries.
pub fn conflict_ports(network: Network) -> PortAssignment {
    match network {
        Network::Main => PortAssignment {
            p2p: 8033,
            public: 8033,
            node_http: 8032,
            wallet_http: 8034,
        },
        Network::Testnet => PortAssignment {
            p2p: 18033,
            public: 18033,
            node_http: 18032,
            wallet_http: 18034,
        },
        Network::Regtest => PortAssignment {
            p2p: 48033,
            public: 48033,
            node_http: 48032,
            wallet_http: 48034,
        },
        Network::Simnet => PortAssignment {
            p2p: 18055,
            public: 18055,
            node_http: 18056,
            wallet_http: 18058,
        },
    }
}

/// True when `library`'s sibling is already installed next to it.
///
/// Only installed libraries count; a sibling that is running from somewhere
/// else is not detected.
pub fn detect_conflict(library: Library, installed: &BTreeSet<String>) -> bool {
    library
        .sibling()
        .is_some_and(|sibling| installed.contains(sibling.name()))
}

/// Option sets for every process a run configures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedConfigs {
    pub daemon: OptionSet,
    pub wallet: OptionSet,
    pub dashboard: Option<OptionSet>,
    pub conflict: bool,
}

impl DerivedConfigs {
    /// The daemon set as it goes into `<lib>.conf`.
    pub fn daemon_file_options(&self) -> OptionSet {
        self.daemon.without(INTERNAL_DAEMON_KEYS)
    }

    /// Whether the daemon must be launched with `--spv`.
    pub fn spv(&self) -> bool {
        self.daemon.get_bool("spv").unwrap_or(false)
    }
}

/// Derive every option set for a run.
///
/// Fresh secrets are drawn for the daemon API key, the wallet API key and
/// the wallet admin token. The dashboard set reuses them.
///
/// # Arguments
/// * `options` - Survey answers
/// * `installed` - Projects already under `libs/`, used for port conflicts
/// * `wallet_prefix` - Daemon data directory the wallet writes under
/// * `secrets` - Source of the generated keys
///
/// # Returns
/// The daemon and wallet sets, plus a dashboard set when bPanel was chosen
pub fn derive_configs(
    options: &Options,
    installed: &BTreeSet<String>,
    wallet_prefix: &str,
    secrets: &impl SecretGenerator,
) -> DerivedConfigs {
    // bcoin and bcash share default ports
    let conflict = detect_conflict(options.library, installed);
    let ports = conflict.then(|| conflict_ports(options.network));

    let mut daemon = OptionSet::new();
    daemon.set("api_key", secrets.generate());
    daemon.set("network", options.network.name());
    daemon.set("prune", options.node == NodeMode::Prune);
    daemon.set("spv", options.node == NodeMode::Spv);

    if options.network == Network::Simnet {
        daemon.set("nodes", options.peers.clone().unwrap_or_default());
    }

    let daemon_api_key = daemon.get_str("api_key").unwrap_or_default().to_string();
    let wallet_api_key = secrets.generate();
    let admin_token = secrets.generate();

    let mut wallet = OptionSet::new();
    wallet.set("api_key", wallet_api_key.clone());
    wallet.set("admin_token", admin_token.clone());
    wallet.set("node_api_key", daemon_api_key.clone());
    wallet.set("network", options.network.name());
    wallet.set("wallet_auth", true);
    wallet.set("token", admin_token.clone());

    if let Some(ports) = ports {
        daemon.set("port", ports.p2p);
        daemon.set("public_port", ports.public);
        daemon.set("http_port", ports.node_http);
        wallet.set("http_port", ports.wallet_http);
        wallet.set("node_port", ports.node_http);
    }

    wallet.set("prefix", wallet_prefix);

    let dashboard = options.dashboard.then(|| {
        let mut dashboard = OptionSet::new();
        dashboard.set("api_key", daemon_api_key);
        dashboard.set("wallet_api_key", wallet_api_key);
        dashboard.set("wallet_token", admin_token);
        dashboard.set("network", options.network.name());
        dashboard.set("chain", options.library.chain());
        dashboard.set("wallet", options.wallet.has_wallet());
        dashboard.set("multisig", options.wallet == WalletMode::Multisig);

        if let Some(ports) = ports {
            dashboard.set("port", ports.node_http);
            dashboard.set("wallet_port", ports.wallet_http);
        }

        dashboard
    });

    tracing::debug!(
        "Derived configs for {} on {}: conflict={}, dashboard={}",
        options.library,
        options.network,
        conflict,
        dashboard.is_some()
    );

    DerivedConfigs {
        daemon,
        wallet,
        dashboard,
        conflict,
    }
}
