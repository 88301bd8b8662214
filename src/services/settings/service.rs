use crate::models::settings::{ClientPrefs, Settings};
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `server_url`
pub const SERVER_URL_ENV: &str = "WEEK_SCHEDULER_SERVER";

const SETTINGS_FILE: &str = "settings.toml";
const PREFS_FILE: &str = "prefs.json";

/// Loads and stores configuration and client preferences in one directory.
pub struct SettingsService {
    dir: PathBuf,
}

impl SettingsService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Service rooted at the platform configuration directory
    pub fn from_project_dirs() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "KenBoyle", "WeekScheduler")
            .ok_or_else(|| anyhow!("Could not determine a configuration directory"))?;
        Ok(Self::new(dirs.config_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.dir.join(PREFS_FILE)
    }

    /// Get the current settings, falling back to defaults when no file exists
    pub fn get(&self) -> Result<Settings> {
        let path = self.settings_path();

        let mut settings = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str::<Settings>(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            log::info!("No settings file at {}, using defaults", path.display());
            Settings::default()
        };

        if let Ok(server_url) = std::env::var(SERVER_URL_ENV) {
            if !server_url.trim().is_empty() {
                log::info!("Server URL overridden by {}", SERVER_URL_ENV);
                settings.server_url = server_url.trim().to_string();
            }
        }

        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        Ok(settings)
    }

    /// Update settings
    pub fn update(&self, settings: &Settings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let raw = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(self.settings_path(), raw).context("Failed to write settings")?;

        Ok(())
    }

    /// Reset settings to defaults
    pub fn reset(&self) -> Result<()> {
        self.update(&Settings::default())
    }

    /// Stored preferences; unreadable files are replaced by defaults.
    pub fn load_prefs(&self) -> ClientPrefs {
        let path = self.prefs_path();
        if !path.exists() {
            return ClientPrefs::default();
        }

        match fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
        {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Failed to load preferences from {}: {}", path.display(), e);
                ClientPrefs::default()
            }
        }
    }

    pub fn save_prefs(&self, prefs: &ClientPrefs) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let raw = serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
        fs::write(self.prefs_path(), raw).context("Failed to write preferences")?;

        Ok(())
    }
}
