// ezbcoin - interactive installer for bcoin, bcash and hsd nodes
//
// This is the library crate containing the installer stages and their data types.
// The binary crate (main.rs) provides the terminal entry point.

pub mod config;
pub mod installer;
pub mod logging;
pub mod models;
pub mod prompt;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{InstallLayout, InstallerSettings, Options, OptionsBuilder};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
