use std::{fs, path::Path};

use anyhow::Context;
use client_core::types::DEFAULT_MAX_NOTIFICATIONS;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "panel.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub device_url: String,
    pub max_notifications: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_url: "http://127.0.0.1:8080".into(),
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    device_url: Option<String>,
    max_notifications: Option<usize>,
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file if it exists, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        if let Some(v) = file_cfg.device_url {
            settings.device_url = v;
        }
        if let Some(v) = file_cfg.max_notifications {
            settings.max_notifications = v;
        }
    }

    if let Some(v) = env("PANEL_DEVICE_URL") {
        settings.device_url = v;
    }
    if let Some(v) = env("APP__DEVICE_URL") {
        settings.device_url = v;
    }

    if let Some(v) = env("PANEL_MAX_NOTIFICATIONS") {
        settings.max_notifications = v
            .parse()
            .with_context(|| format!("PANEL_MAX_NOTIFICATIONS is not a number: '{v}'"))?;
    }

    Ok(settings)
}
