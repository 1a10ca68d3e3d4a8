use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Interface chains started with a context.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InterfaceSettings {
    /// Main interface. Unset selects the best available module.
    pub primary: Option<String>,
    /// Additional user interfaces.
    pub extra: Vec<String>,
    /// Control interfaces such as remote consoles.
    pub control: Vec<String>,
}

impl InterfaceSettings {
    /// Chains in start order, primary first.
    pub fn chains(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_deref().unwrap_or(""))
            .chain(self.extra.iter().map(String::as_str))
            .chain(self.control.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access interface settings: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse interface settings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn settings_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir()?;
    base.push("HarmoniqStudio");
    base.push("interfaces.json");
    Some(base)
}

/// Load settings from the user configuration directory. Returns defaults if
/// loading fails.
pub fn load() -> InterfaceSettings {
    let Some(path) = settings_path() else {
        return InterfaceSettings::default();
    };
    if !path.exists() {
        return InterfaceSettings::default();
    }
    load_from(&path).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), %err, "using default interface settings");
        InterfaceSettings::default()
    })
}

pub fn load_from(path: &Path) -> Result<InterfaceSettings, SettingsError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn save_to(path: &Path, settings: &InterfaceSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}
