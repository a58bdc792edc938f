use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::{SequenceId, Speed};

pub const SETTINGS_FILE: &str = "device.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub default_sequence: SequenceId,
    pub default_speed: Speed,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            default_sequence: SequenceId(1),
            default_speed: Speed::Normal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    default_sequence: Option<i64>,
    default_speed: Option<i64>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
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
        if let Some(v) = file_cfg.bind_addr {
            settings.bind_addr = v;
        }
        if let Some(v) = file_cfg.default_sequence {
            settings.default_sequence = SequenceId(v);
        }
        if let Some(v) = file_cfg.default_speed {
            settings.default_speed = Speed::constrain(v);
        }
    }

    if let Some(v) = env("DEVICE_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("APP__DEFAULT_SEQUENCE") {
        let parsed = v
            .parse::<i64>()
            .with_context(|| format!("APP__DEFAULT_SEQUENCE is not an integer: '{v}'"))?;
        settings.default_sequence = SequenceId(parsed);
    }
    if let Some(v) = env("APP__DEFAULT_SPEED") {
        let parsed = v
            .parse::<i64>()
            .with_context(|| format!("APP__DEFAULT_SPEED is not an integer: '{v}'"))?;
        settings.default_speed = Speed::constrain(parsed);
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
