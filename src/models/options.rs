use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Node library the operator chose to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Library {
    Bcoin,
    Bcash,
    Hsd,
}

impl Library {
    pub const ALL: [Library; 3] = [Library::Bcoin, Library::Bcash, Library::Hsd];

    /// Directory name under `libs/` and `data/`, also the daemon binary name.
    pub fn name(self) -> &'static str {
        match self {
            Library::Bcoin => "bcoin",
            Library::Bcash => "bcash",
            Library::Hsd => "hsd",
        }
    }

    /// Name shown in the library prompt.
    pub fn label(self) -> &'static str {
        match self {
            Library::Hsd => "handshake",
            other => other.name(),
        }
    }

    /// Chain identifier bPanel expects in a client config.
    pub fn chain(self) -> &'static str {
        match self {
            Library::Bcoin => "bitcoin",
            Library::Bcash => "bitcoincash",
            Library::Hsd => "handshake",
        }
    }

    /// The other library that defaults to the same ports, if any.
    pub fn sibling(self) -> Option<Library> {
        match self {
            Library::Bcoin => Some(Library::Bcash),
            Library::Bcash => Some(Library::Bcoin),
            Library::Hsd => None,
        }
    }

    /// Networks offered for this library, in prompt order.
    ///
    /// hsd's public testnet is not offered.
    pub fn networks(self) -> &'static [Network] {
        match self {
            Library::Bcoin | Library::Bcash => &Network::ALL,
            Library::Hsd => &[Network::Main, Network::Regtest, Network::Simnet],
        }
    }

    /// Wallet modes offered for this library, in prompt order.
    ///
    /// bmultisig is a bcoin plugin and is only offered there.
    pub fn wallet_modes(self) -> &'static [WalletMode] {
        match self {
            Library::Bcoin => &WalletMode::ALL,
            Library::Bcash | Library::Hsd => &[WalletMode::None, WalletMode::Bwallet],
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Main,
    Testnet,
    Regtest,
    Simnet,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Main,
        Network::Testnet,
        Network::Regtest,
        Network::Simnet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
            Network::Simnet => "simnet",
        }
    }

    /// Local test networks where bPanel gets the mining plugin.
    pub fn is_local(self) -> bool {
        matches!(self, Network::Regtest | Network::Simnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full node, pruned node or SPV client. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeMode {
    Full,
    Prune,
    Spv,
}

impl NodeMode {
    pub const ALL: [NodeMode; 3] = [NodeMode::Full, NodeMode::Prune, NodeMode::Spv];

    pub fn label(self) -> &'static str {
        match self {
            NodeMode::Full => "full",
            NodeMode::Prune => "prune",
            NodeMode::Spv => "SPV",
        }
    }
}

impl fmt::Display for NodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletMode {
    /// Run the node with `--no-wallet`.
    None,
    /// The daemon's built-in wallet plugin.
    Bwallet,
    /// The separate bmultisig wallet service.
    Multisig,
}

impl WalletMode {
    pub const ALL: [WalletMode; 3] = [WalletMode::None, WalletMode::Bwallet, WalletMode::Multisig];

    pub fn label(self) -> &'static str {
        match self {
            WalletMode::None => "none",
            WalletMode::Bwallet => "bwallet",
            WalletMode::Multisig => "bmultisig",
        }
    }

    pub fn has_wallet(self) -> bool {
        self != WalletMode::None
    }
}

impl fmt::Display for WalletMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("No answer recorded for {0}")]
    Missing(&'static str),
}

/// Every answer collected by the survey. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub path: Utf8PathBuf,
    pub library: Library,
    pub network: Network,
    pub node: NodeMode,
    pub wallet: WalletMode,
    /// Comma-separated peer addresses, only asked for on simnet.
    pub peers: Option<String>,
    pub dashboard: bool,
}

/// Accumulates survey answers stage by stage.
///
/// Each stage consumes the builder and hands back a new one, so a later stage
/// can read earlier answers but never rewrite them behind the caller's back.
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    path: Option<Utf8PathBuf>,
    library: Option<Library>,
    network: Option<Network>,
    node: Option<NodeMode>,
    wallet: Option<WalletMode>,
    peers: Option<String>,
    dashboard: Option<bool>,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(self, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..self
        }
    }

    pub fn with_library(self, library: Library) -> Self {
        Self {
            library: Some(library),
            ..self
        }
    }

    pub fn with_node(self, network: Network, node: NodeMode, wallet: WalletMode) -> Self {
        Self {
            network: Some(network),
            node: Some(node),
            wallet: Some(wallet),
            ..self
        }
    }

    pub fn with_peers(self, peers: impl Into<String>) -> Self {
        Self {
            peers: Some(peers.into()),
            ..self
        }
    }

    pub fn with_dashboard(self, dashboard: bool) -> Self {
        Self {
            dashboard: Some(dashboard),
            ..self
        }
    }

    pub fn path(&self) -> Option<&Utf8PathBuf> {
        self.path.as_ref()
    }

    pub fn library(&self) -> Option<Library> {
        self.library
    }

    pub fn network(&self) -> Option<Network> {
        self.network
    }

    pub fn build(self) -> Result<Options, OptionsError> {
        let network = self.network.ok_or(OptionsError::Missing("network"))?;
        Ok(Options {
            path: self.path.ok_or(OptionsError::Missing("path"))?,
            library: self.library.ok_or(OptionsError::Missing("library"))?,
            network,
            node: self.node.ok_or(OptionsError::Missing("node"))?,
            wallet: self.wallet.ok_or(OptionsError::Missing("wallet"))?,
            // Peers only mean something on simnet
            peers: self.peers.filter(|_| network == Network::Simnet),
            dashboard: self.dashboard.unwrap_or(false),
        })
    }
}
