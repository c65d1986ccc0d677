use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sync::TransportKind;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "slidesync";

pub const KEYS: &[&str] = &[
    "defaults.theme",
    "defaults.presenter",
    "sync.transport",
    "sync.topic",
    "sync.per_deck",
    "sync.dir",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    /// Open every view in presenter mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// `file`, `local` or `off`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Give each deck its own topic, derived from the file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_deck: Option<bool>,

    /// Directory shared by the file transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid value for {key}: {value}. Must be 'true' or 'false'."),
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `slidesync config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# slidesync configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Transport to use when none is given on the command line. Unknown names
    /// fall back to the default with a warning.
    pub fn transport_kind(&self) -> TransportKind {
        let Some(name) = self.sync.as_ref().and_then(|s| s.transport.as_deref()) else {
            return TransportKind::default();
        };
        TransportKind::from_name(name).unwrap_or_else(|| {
            tracing::warn!("Unknown sync.transport '{name}' in config, using default");
            TransportKind::default()
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            "defaults.presenter" => {
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .presenter = Some(parse_bool(key, value)?);
            }
            "sync.transport" => {
                let Some(kind) = TransportKind::from_name(value) else {
                    anyhow::bail!(
                        "Invalid transport: {value}. Must be 'file', 'local', or 'off'."
                    );
                };
                self.sync.get_or_insert_with(SyncConfig::default).transport =
                    Some(kind.name().to_string());
            }
            "sync.topic" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Invalid topic: must not be empty.");
                }
                self.sync.get_or_insert_with(SyncConfig::default).topic =
                    Some(value.to_string());
            }
            "sync.per_deck" => {
                self.sync.get_or_insert_with(SyncConfig::default).per_deck =
                    Some(parse_bool(key, value)?);
            }
            "sync.dir" => {
                self.sync.get_or_insert_with(SyncConfig::default).dir = Some(PathBuf::from(value));
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {}", KEYS.join(", ")),
        }
        Ok(())
    }
}
