//! JSON settings persistence.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use gardener_core::defaults::{CONFIG_DIR, PLUGIN_ID, SETTINGS_FILE};
use gardener_core::{Error, Result, Settings};

/// Loads and saves [`Settings`] as a JSON file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the plugin's usual location inside a vault:
    /// `<vault>/.obsidian/plugins/digital-gardener/data.json`.
    pub fn for_vault(vault_root: &Path) -> Self {
        Self::new(Self::default_path(vault_root))
    }

    pub fn default_path(vault_root: &Path) -> PathBuf {
        vault_root
            .join(CONFIG_DIR)
            .join("plugins")
            .join(PLUGIN_ID)
            .join(SETTINGS_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing file yields defaults; missing keys take their
    /// default values.
    pub async fn load(&self) -> Result<Settings> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings: Settings = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!(
                "Invalid settings file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        if let Err(e) = settings.validate() {
            warn!(path = %self.path.display(), error = %e, "Loaded settings are out of range");
        }
        Ok(settings)
    }

    /// Save settings via a temporary file and rename.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &self.path).await?;

        info!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}
