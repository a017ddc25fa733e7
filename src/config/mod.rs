use crate::models::InstallerSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment};
use std::fs;

/// Name of the settings file looked up in the settings directory.
pub const SETTINGS_FILE: &str = "ezbcoin.yaml";

/// Prefix of environment variables that override settings, e.g.
/// `EZBCOIN_READINESS_TIMEOUT_SECS=30`.
pub const ENV_PREFIX: &str = "EZBCOIN";

/// Where the base settings came from, before environment overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    File,
    Defaults,
}

/// Loads [`InstallerSettings`] from `ezbcoin.yaml` and the environment.
///
/// The file is optional. Environment overrides are applied on top of whatever
/// the file (or the defaults) provided.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    pub fn new<P: AsRef<Utf8Path>>(settings_dir: P) -> Self {
        let settings_dir = settings_dir.as_ref().to_path_buf();
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
            settings_dir,
        }
    }

    /// Read the settings file.
    ///
    /// # Returns
    /// `None` if the file doesn't exist, the parsed settings otherwise
    pub fn read_file_settings(&self) -> Result<Option<InstallerSettings>> {
        if !self.settings_path.exists() {
            return Ok(None);
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: InstallerSettings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        Ok(Some(settings))
    }

    /// Load settings from the file, or defaults if it doesn't exist.
    pub fn load_file_settings(&self) -> Result<InstallerSettings> {
        Ok(self.read_file_settings()?.unwrap_or_default())
    }

    /// Load settings from the file and apply `EZBCOIN_*` overrides.
    ///
    /// Runs before logging exists, so nothing is logged here. Pass the
    /// returned [`SettingsSource`] to [`ConfigManager::log_source`] once a
    /// subscriber is installed.
    ///
    /// # Returns
    /// The effective settings and where their base came from
    pub fn load_settings(&self) -> Result<(InstallerSettings, SettingsSource)> {
        let (base, source) = match self.read_file_settings()? {
            Some(settings) => (settings, SettingsSource::File),
            None => (InstallerSettings::default(), SettingsSource::Defaults),
        };
        let settings = self.apply_env_overrides(base, Environment::with_prefix(ENV_PREFIX))?;
        Ok((settings, source))
    }

    /// Report where the settings came from.
    pub fn log_source(&self, source: SettingsSource) {
        match source {
            SettingsSource::File => tracing::info!("Loaded settings from {}", self.settings_path),
            SettingsSource::Defaults => tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            ),
        }
    }

    /// Layer an environment source over `base`.
    ///
    /// Split out so tests can pass an explicit source instead of mutating the
    /// process environment.
    pub fn apply_env_overrides(
        &self,
        base: InstallerSettings,
        env: Environment,
    ) -> Result<InstallerSettings> {
        let defaults = Config::try_from(&base).context("Failed to stage settings")?;

        let settings: InstallerSettings = Config::builder()
            .add_source(defaults)
            .add_source(env.prefix_separator("_").try_parsing(true))
            .build()
            .context("Failed to merge environment overrides")?
            .try_deserialize()
            .context("Invalid settings after environment overrides")?;

        tracing::debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    pub fn settings_dir(&self) -> &Utf8Path {
        &self.settings_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}
