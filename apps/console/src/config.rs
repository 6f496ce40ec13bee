use std::{fs, path::Path};

use anyhow::Context;
use client_core::routing::normalize_root;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Records API base. `None` runs against the built-in demo store.
    pub api_url: Option<String>,
    pub app_root: String,
    pub stats_path: String,
    pub search_delay_ms: u64,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            app_root: "/admin/users/".into(),
            stats_path: "/projects/".into(),
            search_delay_ms: 0,
            page_size: 5,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    app_root: Option<String>,
    stats_path: Option<String>,
    search_delay_ms: Option<u64>,
    page_size: Option<usize>,
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
        .with_context(|| format!("invalid settings in '{}'", path.display()))
}

/// File values first, then environment overrides (`APP__*` wins over the bare name).
pub fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings = toml::from_str(raw).context("failed to parse toml")?;
        if let Some(v) = file_cfg.api_url {
            settings.api_url = Some(v);
        }
        if let Some(v) = file_cfg.app_root {
            settings.app_root = v;
        }
        if let Some(v) = file_cfg.stats_path {
            settings.stats_path = v;
        }
        if let Some(v) = file_cfg.search_delay_ms {
            settings.search_delay_ms = v;
        }
        if let Some(v) = file_cfg.page_size {
            settings.page_size = v;
        }
    }

    if let Some(v) = env("API_URL") {
        settings.api_url = Some(v);
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = Some(v);
    }
    if let Some(v) = env("APP__ROOT") {
        settings.app_root = v;
    }
    if let Some(v) = env("APP__STATS_PATH") {
        settings.stats_path = v;
    }
    if let Some(v) = env("APP__SEARCH_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.search_delay_ms = parsed;
        }
    }
    if let Some(v) = env("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.page_size = parsed;
        }
    }

    settings.api_url = settings
        .api_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());
    settings.app_root = normalize_root(&settings.app_root);
    settings.page_size = settings.page_size.max(1);
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
