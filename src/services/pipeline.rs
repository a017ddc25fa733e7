//! Fetch and dependency-install stages.
//!
//! Both stages run their steps one after another through a [`CommandRunner`]
//! and apply a [`StepPolicy`] to every non-zero exit.

use crate::models::{ExternalProject, InstallLayout, StepPolicy};
use crate::services::process::{CommandRunner, CommandSpec, ProcessError, StepOutcome, banner};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Result of one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Projects the stage did work for, in order.
    pub processed: Vec<ExternalProject>,
    /// Projects left alone because they were already installed.
    pub skipped: Vec<ExternalProject>,
    pub outcomes: Vec<StepOutcome>,
}

impl StageReport {
    /// Steps that exited non-zero but were tolerated by a `Warn` policy.
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success())
    }

    pub fn processed_dirs(&self) -> Vec<&'static str> {
        self.processed.iter().map(|project| project.dir).collect()
    }
}

/// Apply `policy` to a finished step. Returns whether the step succeeded.
pub fn enforce_policy(outcome: &StepOutcome, policy: StepPolicy) -> Result<bool, ProcessError> {
    if outcome.success() {
        return Ok(true);
    }

    match policy {
        StepPolicy::Warn => {
            let err = ProcessError::StepFailed {
                label: outcome.label.clone(),
                exit_code: outcome.exit_code,
            };
            tracing::warn!("{}, continuing", err);
            eprintln!("Warning: {}", err);
            Ok(false)
        }
        StepPolicy::Abort => Err(ProcessError::StepFailed {
            label: outcome.label.clone(),
            exit_code: outcome.exit_code,
        }),
    }
}

/// Revision to check out for `project`: the settings override, else the
/// project's own pin.
pub fn pinned_revision(project: &ExternalProject, revisions: &IndexMap<String, String>) -> Option<String> {
    revisions
        .get(project.dir)
        .cloned()
        .or_else(|| project.revision.map(str::to_string))
}

/// Clone every project in `required` whose directory is not in `installed`.
///
/// A pinned revision is checked out right after its clone. A project only
/// counts as processed if its clone succeeded, so a tolerated clone failure
/// never leads to an install in a missing directory.
///
/// # Arguments
/// * `runner` - Executes `git`; [`RelayRunner`](crate::services::RelayRunner) in production
/// * `layout` - Install layout, clones land in its `libs/` directory
/// * `required` - Projects this run needs, in fetch order
/// * `installed` - Directory names already present under `libs/`
/// * `revisions` - Per-project revision overrides from settings
/// * `policy` - What a non-zero `git` exit does
///
/// # Returns
/// A [`StageReport`] whose `processed` list feeds [`install_projects`], or the
/// first failure under [`StepPolicy::Abort`]
pub async fn fetch_projects<R: CommandRunner>(
    runner: &R,
    layout: &InstallLayout,
    required: &[ExternalProject],
    installed: &BTreeSet<String>,
    revisions: &IndexMap<String, String>,
    policy: StepPolicy,
) -> Result<StageReport, ProcessError> {
    let mut report = StageReport::default();
    let libs_dir = layout.libs_dir();

    for project in required {
        // Earlier runs' checkouts are left untouched
        if installed.contains(project.dir) {
            tracing::info!("{} already installed, skipping fetch", project.dir);
            report.skipped.push(*project);
            continue;
        }

        println!("{}", banner(&format!("Downloading from GitHub: {}...", project.dir)));
        tracing::info!("Cloning {} from {}", project.dir, project.repo);
        let clone = CommandSpec::new(format!("clone {}", project.dir), "git", &libs_dir)
            .args(["clone", project.repo]);
        let outcome = runner.run(&clone).await?;
        let cloned = enforce_policy(&outcome, policy)?;
        report.outcomes.push(outcome);

        // Nothing to check out or install
        if !cloned {
            continue;
        }

        if let Some(revision) = pinned_revision(project, revisions) {
            let checkout = CommandSpec::new(
                format!("checkout {} {}", project.dir, revision),
                "git",
                &layout.project_dir(project.dir),
            )
            .args(["checkout", revision.as_str()]);
            let outcome = runner.run(&checkout).await?;
            enforce_policy(&outcome, policy)?;
            report.outcomes.push(outcome);
        }

        report.processed.push(*project);
    }

    tracing::info!(
        "Fetch stage done: fetched {:?}, skipped {}",
        report.processed_dirs(),
        report.skipped.len()
    );
    Ok(report)
}

/// Run `npm install` in each of `fetched`.
pub async fn install_projects<R: CommandRunner>(
    runner: &R,
    layout: &InstallLayout,
    fetched: &[ExternalProject],
    policy: StepPolicy,
) -> Result<StageReport, ProcessError> {
    let mut report = StageReport::default();

    for project in fetched {
        println!("{}", banner(&format!("Installing: {}...", project.dir)));
        let install = CommandSpec::new(
            format!("install {}", project.dir),
            "npm",
            &layout.project_dir(project.dir),
        )
        .arg("install");
        let outcome = runner.run(&install).await?;
        enforce_policy(&outcome, policy)?;
        report.outcomes.push(outcome);
        report.processed.push(*project);
    }

    tracing::info!(
        "Install stage done: {} projects, {} failures",
        report.processed.len(),
        report.failures().count()
    );
    Ok(report)
}
