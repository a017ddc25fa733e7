use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a fetch or install subprocess exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepPolicy {
    /// Log a warning naming the step and keep going.
    #[default]
    Warn,
    /// Stop the run.
    Abort,
}

/// Installer behaviour from `ezbcoin.yaml`.
///
/// None of these change what gets installed; those choices only come from the
/// survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSettings {
    /// Relay all dashboard output, log to the console, skip the final shell.
    pub debug_mode: bool,

    pub log_dir: String,

    /// Seconds to wait for the dashboard readiness marker. `0` waits forever.
    pub readiness_timeout_secs: u64,

    pub fetch_policy: StepPolicy,

    pub install_policy: StepPolicy,

    /// Interactive shell for the handoff.
    pub shell: String,

    pub dashboard_url: String,

    /// Maximum characters of an echoed dashboard log line.
    pub echo_width: usize,

    /// Pinned revision per project directory, checked out after cloning.
    pub revisions: IndexMap<String, String>,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            log_dir: "logs".to_string(),
            readiness_timeout_secs: 600,
            fetch_policy: StepPolicy::Warn,
            install_policy: StepPolicy::Warn,
            shell: "bash".to_string(),
            dashboard_url: "http://localhost:5000".to_string(),
            echo_width: 120,
            revisions: IndexMap::new(),
        }
    }
}

impl InstallerSettings {
    pub fn readiness_timeout(&self) -> Option<Duration> {
        match self.readiness_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
