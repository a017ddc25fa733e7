use super::options::{Library, Network};
use camino::{Utf8Path, Utf8PathBuf};

/// Directory name of the dashboard under `libs/` and `data/`.
pub const DASHBOARD_DIR: &str = "bpanel";

/// Every path the installer reads or writes, derived from the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: Utf8PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Cloned source trees.
    pub fn libs_dir(&self) -> Utf8PathBuf {
        self.root.join("libs")
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.root.join("data")
    }

    pub fn project_dir(&self, dir: &str) -> Utf8PathBuf {
        self.libs_dir().join(dir)
    }

    /// `--prefix` of the node daemon.
    pub fn library_data_dir(&self, library: Library) -> Utf8PathBuf {
        self.data_dir().join(library.name())
    }

    pub fn network_data_dir(&self, library: Library, network: Network) -> Utf8PathBuf {
        self.library_data_dir(library).join(network.name())
    }

    pub fn library_conf(&self, library: Library) -> Utf8PathBuf {
        self.library_data_dir(library)
            .join(format!("{}.conf", library.name()))
    }

    /// Main network wallets live directly in the library data dir; every
    /// other network gets its own subdirectory.
    pub fn wallet_dir(&self, library: Library, network: Network) -> Utf8PathBuf {
        match network {
            Network::Main => self.library_data_dir(library),
            _ => self.network_data_dir(library, network),
        }
    }

    pub fn wallet_conf(&self, library: Library, network: Network) -> Utf8PathBuf {
        self.wallet_dir(library, network).join("wallet.conf")
    }

    pub fn dashboard_data_dir(&self) -> Utf8PathBuf {
        self.data_dir().join(DASHBOARD_DIR)
    }

    pub fn dashboard_clients_dir(&self) -> Utf8PathBuf {
        self.dashboard_data_dir().join("clients")
    }

    pub fn dashboard_client_conf(&self, library: Library) -> Utf8PathBuf {
        self.dashboard_clients_dir()
            .join(format!("{}.conf", library.name()))
    }

    pub fn dashboard_config_js(&self) -> Utf8PathBuf {
        self.dashboard_data_dir().join("config.js")
    }
}
