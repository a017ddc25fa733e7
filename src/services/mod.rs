//! Services module - everything the installer does after the survey.
//!
//! The services have no terminal prompts of their own and take every input as
//! a parameter, so each stage can be exercised on its own.
//!
//! # Components
//!
//! - [`prereq`]: `git`, `npm` and `node` availability and versions
//! - [`filesystem`]: install root preparation and the installed-project listing
//! - [`derivation`]: option sets for the daemon, the wallet and the dashboard,
//!   including the alternate ports used when bcoin and bcash share a root
//! - [`materialize`]: writing those sets as `key: value` files and bPanel's
//!   `config.js`
//! - [`process`]: subprocess spawning with relayed or captured output
//! - [`pipeline`]: the clone/checkout and `npm install` stages
//! - [`readiness`]: waiting for the dashboard's readiness marker
//! - [`launch`]: starting the daemon, bmultisig and bPanel
//! - [`handoff`]: shortcut variables and the interactive shell
//!
//! # Stage order
//!
//! 1. Filesystem preparation
//! 2. Configuration derivation
//! 3. Configuration materialization
//! 4. Fetch
//! 5. Dependency install
//! 6. Process launch
//! 7. Operator handoff

pub mod derivation;
pub mod filesystem;
pub mod handoff;
pub mod launch;
pub mod materialize;
pub mod pipeline;
pub mod prereq;
pub mod process;
pub mod readiness;

pub use derivation::{DerivedConfigs, OsSecretGenerator, SecretGenerator, derive_configs};
pub use pipeline::{StageReport, fetch_projects, install_projects};
pub use process::{CommandRunner, CommandSpec, ProcessError, RelayRunner, StepOutcome};
pub use readiness::{ReadinessError, ReadinessProbe, ReadinessState};
