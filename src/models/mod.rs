//! Data models for the installer.
//!
//! - [`Options`]: the survey answers, built stage by stage with [`OptionsBuilder`]
//! - [`OptionSet`]: one process's `key: value` options in insertion order
//! - [`InstallLayout`]: every path under the install root
//! - [`ExternalProject`]: the repositories that can be cloned into `libs/`
//! - [`InstallerSettings`]: installer behaviour loaded from `ezbcoin.yaml`

pub mod layout;
pub mod option_set;
pub mod options;
pub mod project;
pub mod settings;

pub use layout::InstallLayout;
pub use option_set::{ConfigValue, OptionSet};
pub use options::{Library, Network, NodeMode, Options, OptionsBuilder, OptionsError, WalletMode};
pub use project::{ExternalProject, required_projects};
pub use settings::{InstallerSettings, StepPolicy};
