//! Install directory preparation and discovery of already-installed projects.

use crate::models::{InstallLayout, Options};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs;

/// Directories touched by a preparation step.
#[derive(Debug, Default)]
pub struct PreparedDirs {
    pub created: Vec<Utf8PathBuf>,
    pub already_existed: Vec<Utf8PathBuf>,
}

impl PreparedDirs {
    fn record(&mut self, path: &Utf8Path, created: bool) {
        if created {
            self.created.push(path.to_path_buf());
        } else {
            self.already_existed.push(path.to_path_buf());
        }
    }
}

/// Create `path` if absent.
///
/// Returns `true` if it was created. A non-directory in the way is an error.
pub fn ensure_dir(path: &Utf8Path) -> Result<bool> {
    if path.exists() {
        if path.is_dir() {
            Ok(false)
        } else {
            bail!("Path exists but is not a directory: {}", path);
        }
    } else {
        fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {}", path))?;
        tracing::debug!("Created directory {}", path);
        Ok(true)
    }
}

/// Create the root with `libs/` and `data/` and return the canonical layout.
///
/// Canonicalizing keeps every `--prefix` handed to a daemon absolute, whatever
/// the operator typed.
pub fn prepare_root(root: &Utf8Path) -> Result<(InstallLayout, PreparedDirs)> {
    let mut prepared = PreparedDirs::default();

    let created = ensure_dir(root)?;
    prepared.record(root, created);

    let root = root
        .canonicalize_utf8()
        .with_context(|| format!("Failed to resolve install path: {}", root))?;
    let layout = InstallLayout::new(root);

    for dir in [layout.libs_dir(), layout.data_dir()] {
        let created = ensure_dir(&dir)?;
        prepared.record(&dir, created);
    }

    Ok((layout, prepared))
}

/// Create the per-library, per-network and dashboard data directories.
pub fn prepare_run_dirs(layout: &InstallLayout, options: &Options) -> Result<PreparedDirs> {
    let mut prepared = PreparedDirs::default();

    let mut dirs = vec![
        layout.library_data_dir(options.library),
        layout.network_data_dir(options.library, options.network),
    ];
    if options.dashboard {
        dirs.push(layout.dashboard_data_dir());
        dirs.push(layout.dashboard_clients_dir());
    }

    for dir in dirs {
        let created = ensure_dir(&dir)?;
        prepared.record(&dir, created);
    }

    Ok(prepared)
}

/// Names of the non-hidden entries directly under `libs_dir`.
///
/// A missing directory yields an empty set.
pub fn list_installed(libs_dir: &Utf8Path) -> Result<BTreeSet<String>> {
    let mut installed = BTreeSet::new();
    if !libs_dir.exists() {
        return Ok(installed);
    }

    let entries = libs_dir
        .read_dir_utf8()
        .with_context(|| format!("Failed to list {}", libs_dir))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", libs_dir))?;
        let name = entry.file_name();
        if !name.starts_with('.') {
            installed.insert(name.to_string());
        }
    }

    tracing::info!("Installed under {}: {:?}", libs_dir, installed);
    Ok(installed)
}
