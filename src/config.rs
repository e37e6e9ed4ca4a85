use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::KeyCode;
use serde::Deserialize;
use tracing::warn;

/// Refresh cadence never goes below this, whatever the config says.
pub const MIN_REFRESH_RATE_MS: u64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub colors: ColorsConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub interval_step_ms: u64,
    pub cpu_sample_ms: u64,
    pub process_limit: usize,
    pub default_sort: String,
    pub color_support: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 1000,
            interval_step_ms: 250,
            cpu_sample_ms: 200,
            process_limit: 50,
            default_sort: "cpu".to_string(),
            color_support: "auto".to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms.max(MIN_REFRESH_RATE_MS))
    }

    pub fn interval_step(&self) -> Duration {
        Duration::from_millis(self.interval_step_ms.max(1))
    }

    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub theme: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        ColorsConfig {
            theme: "dark".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
    pub search: String,
    pub sort_cpu: String,
    pub sort_memory: String,
    pub sort_pid: String,
    pub cycle_sort: String,
    pub slower: String,
    pub faster: String,
    pub help: String,
    pub refresh: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "q".to_string(),
            search: "/".to_string(),
            sort_cpu: "c".to_string(),
            sort_memory: "m".to_string(),
            sort_pid: "p".to_string(),
            cycle_sort: "s".to_string(),
            slower: "+".to_string(),
            faster: "-".to_string(),
            help: "?".to_string(),
            refresh: "r".to_string(),
        }
    }
}

/// Parses a keybind name from the config file: a single character or one of
/// the named keys.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match s.to_lowercase().as_str() {
        "space" => Some(KeyCode::Char(' ')),
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "backspace" => Some(KeyCode::Backspace),
        "delete" | "del" => Some(KeyCode::Delete),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" => Some(KeyCode::PageUp),
        "pagedown" => Some(KeyCode::PageDown),
        _ => None,
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hidetop").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "invalid config, using defaults");
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}
