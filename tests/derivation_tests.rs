//! Integration tests for configuration derivation
//!
//! These tests verify, over every valid library/network/node/wallet choice:
//! - Required keys in the daemon and wallet sets
//! - Mutually exclusive `prune`/`spv` flags matching the node mode
//! - Sibling conflict detection and the alternate port keys

use ezbcoin::models::{Library, Network, NodeMode, Options, OptionsBuilder, WalletMode};
use ezbcoin::services::derivation::{SecretGenerator, conflict_ports, derive_configs};
use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use std::cell::Cell;
use std::collections::BTreeSet;

const PORT_KEYS: &[&str] = &["port", "public_port", "http_port", "node_port", "wallet_port"];

struct SequentialSecrets(Cell<u32>);

impl SequentialSecrets {
    fn new() -> Self {
        Self(Cell::new(0))
    }
}

impl SecretGenerator for SequentialSecrets {
    fn generate(&self) -> String {
        self.0.set(self.0.get() + 1);
        format!("{:064x}", self.0.get())
    }
}

fn options_strategy() -> impl Strategy<Value = Options> {
    select(Library::ALL.to_vec())
        .prop_flat_map(|library| {
            (
                Just(library),
                select(library.networks().to_vec()),
                select(NodeMode::ALL.to_vec()),
                select(library.wallet_modes().to_vec()),
                any::<bool>(),
            )
        })
        .prop_map(|(library, network, node, wallet, dashboard)| {
            OptionsBuilder::new()
                .with_path("/opt/ez")
                .with_library(library)
                .with_node(network, node, wallet)
                .with_peers("127.0.0.1:18555")
                .with_dashboard(dashboard)
                .build()
                .unwrap()
        })
}

fn installed_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    subsequence(vec!["bcoin", "bcash", "hsd", "bpanel", "bmultisig"], 0..=5)
        .prop_map(|names| names.into_iter().map(str::to_string).collect())
}

proptest! {
    #[test]
    fn prop_required_keys_and_node_flags(options in options_strategy(), installed in installed_strategy()) {
        let derived = derive_configs(&options, &installed, "/opt/ez/data/lib", &SequentialSecrets::new());

        for set in [&derived.daemon, &derived.wallet] {
            prop_assert!(set.get_str("api_key").is_some_and(|key| key.len() == 64));
            prop_assert_eq!(set.get_str("network"), Some(options.network.name()));
        }

        let prune = derived.daemon.get_bool("prune").unwrap();
        let spv = derived.daemon.get_bool("spv").unwrap();
        prop_assert!(!(prune && spv));
        prop_assert_eq!(prune, options.node == NodeMode::Prune);
        prop_assert_eq!(spv, options.node == NodeMode::Spv);

        prop_assert_eq!(derived.daemon.contains_key("nodes"), options.network == Network::Simnet);
        prop_assert_eq!(derived.dashboard.is_some(), options.dashboard);
    }

    #[test]
    fn prop_conflict_ports(options in options_strategy(), installed in installed_strategy()) {
        let derived = derive_configs(&options, &installed, "/opt/ez/data/lib", &SequentialSecrets::new());

        let sibling_installed = options
            .library
            .sibling()
            .is_some_and(|sibling| installed.contains(sibling.name()));
        prop_assert_eq!(derived.conflict, sibling_installed);

        if derived.conflict {
            let ports = conflict_ports(options.network);
            prop_assert_eq!(derived.daemon.get_int("port"), Some(i64::from(ports.p2p)));
            prop_assert_eq!(derived.daemon.get_int("public_port"), Some(i64::from(ports.public)));
            prop_assert_eq!(derived.daemon.get_int("http_port"), Some(i64::from(ports.node_http)));
            prop_assert_eq!(derived.wallet.get_int("http_port"), Some(i64::from(ports.wallet_http)));
            prop_assert_eq!(derived.wallet.get_int("node_port"), Some(i64::from(ports.node_http)));
        } else {
            for key in PORT_KEYS {
                prop_assert!(!derived.daemon.contains_key(key));
                prop_assert!(!derived.wallet.contains_key(key));
                if let Some(dashboard) = &derived.dashboard {
                    prop_assert!(!dashboard.contains_key(key));
                }
            }
        }
    }
}

#[test]
fn test_simnet_conflict_ports() {
    let ports = conflict_ports(Network::Simnet);
    assert_eq!(
        (ports.p2p, ports.public, ports.node_http, ports.wallet_http),
        (18055, 18055, 18056, 18058)
    );
}

#[test]
fn test_hsd_never_conflicts() {
    let options = OptionsBuilder::new()
        .with_path("/opt/ez")
        .with_library(Library::Hsd)
        .with_node(Network::Main, NodeMode::Full, WalletMode::Bwallet)
        .build()
        .unwrap();
    let installed: BTreeSet<String> = ["bcoin", "bcash"].iter().map(|s| s.to_string()).collect();

    let derived = derive_configs(&options, &installed, "/opt/ez/data/hsd", &SequentialSecrets::new());
    assert!(!derived.conflict);
}
