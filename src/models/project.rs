use super::options::{Library, Options, WalletMode};

/// A repository the installer can clone into `libs/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalProject {
    /// Directory name `git clone` produces under `libs/`.
    pub dir: &'static str,
    pub repo: &'static str,
    /// Revision checked out after cloning. Settings may override it.
    pub revision: Option<&'static str>,
}

pub const BCOIN: ExternalProject = ExternalProject {
    dir: "bcoin",
    repo: "https://github.com/bcoin-org/bcoin",
    revision: None,
};

pub const BCASH: ExternalProject = ExternalProject {
    dir: "bcash",
    repo: "https://github.com/bcoin-org/bcash",
    revision: None,
};

pub const HSD: ExternalProject = ExternalProject {
    dir: "hsd",
    repo: "https://github.com/handshake-org/hsd",
    revision: None,
};

pub const BPANEL: ExternalProject = ExternalProject {
    dir: "bpanel",
    repo: "https://github.com/bpanel-org/bpanel",
    revision: None,
};

pub const BPANEL_CLI: ExternalProject = ExternalProject {
    dir: "bpanel-cli",
    repo: "https://github.com/bpanel-org/bpanel-cli",
    revision: None,
};

pub const BMULTISIG: ExternalProject = ExternalProject {
    dir: "bmultisig",
    repo: "https://github.com/bcoin-org/bmultisig",
    revision: None,
};

impl ExternalProject {
    pub fn for_library(library: Library) -> ExternalProject {
        match library {
            Library::Bcoin => BCOIN,
            Library::Bcash => BCASH,
            Library::Hsd => HSD,
        }
    }
}

/// Projects a run needs on disk, in fetch order.
pub fn required_projects(options: &Options) -> Vec<ExternalProject> {
    let mut projects = vec![ExternalProject::for_library(options.library)];

    if options.wallet == WalletMode::Multisig {
        projects.push(BMULTISIG);
    }

    if options.dashboard {
        projects.push(BPANEL);
        projects.push(BPANEL_CLI);
    }

    projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Network, NodeMode, OptionsBuilder};

    fn options(wallet: WalletMode, dashboard: bool) -> Options {
        OptionsBuilder::new()
            .with_path("/tmp/app")
            .with_library(Library::Bcoin)
            .with_node(Network::Main, NodeMode::Full, wallet)
            .with_dashboard(dashboard)
            .build()
            .unwrap()
    }

    #[test]
    fn test_library_only() {
        let dirs: Vec<_> = required_projects(&options(WalletMode::Bwallet, false))
            .iter()
            .map(|p| p.dir)
            .collect();
        assert_eq!(dirs, vec!["bcoin"]);
    }

    #[test]
    fn test_everything() {
        let dirs: Vec<_> = required_projects(&options(WalletMode::Multisig, true))
            .iter()
            .map(|p| p.dir)
            .collect();
        assert_eq!(dirs, vec!["bcoin", "bmultisig", "bpanel", "bpanel-cli"]);
    }
}
