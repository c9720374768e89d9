use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::list::ScrollConfig;
use crate::theme::ThemeVariant;

const APP_SENTINEL: &str = "scrollfeed";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    pub theme: Option<ThemeVariant>,

    #[serde(default)]
    pub list: ListSettings,
}

/// The `[list]` table. Unset keys keep the value already in the config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListSettings {
    pub item_gap: Option<u32>,
    pub items_per_load: Option<usize>,
    pub end_of_list_label: Option<String>,
    pub show_loading_placeholder: Option<bool>,
    pub initial_page: Option<u32>,
    pub scroll_throttle_ms: Option<u64>,
}

impl ListSettings {
    pub fn apply(&self, config: &mut ScrollConfig) {
        if let Some(gap) = self.item_gap {
            config.item_gap = gap;
        }
        if let Some(count) = self.items_per_load {
            config.items_per_load = count;
        }
        if let Some(label) = &self.end_of_list_label {
            config.end_of_list_label.clone_from(label);
        }
        if let Some(show) = self.show_loading_placeholder {
            config.show_loading_placeholder = show;
        }
        if let Some(page) = self.initial_page {
            config.initial_page = page;
        }
        if let Some(ms) = self.scroll_throttle_ms {
            config.scroll_throttle = Duration::from_millis(ms);
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            theme: None,
            list: ListSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        if self.list.items_per_load == Some(0) {
            bail!("list.items_per_load must be at least 1");
        }
        Ok(())
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("scrollfeed")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn log_path(config_dir: &Path) -> PathBuf {
    config_dir.join("scrollfeed.log")
}
