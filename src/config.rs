//! Configuration for init-keyboard
//!
//! Every field defaults to the fixed keyboard setup, so running without a
//! config file (or with a partial one) behaves exactly like the stock tool.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// vendor:product of the keyboard that swaps Caps Lock and Escape in firmware
pub const FIRMWARE_SWAP_DEVICE: &str = "1d50:6122";

const APP_NAME: &str = "init-keyboard";
const SYSTEM_CONFIG_PATH: &str = "/etc/init-keyboard.toml";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Serialize concurrent invocations with a lock file
    #[serde(default = "default_true")]
    pub serialize: bool,

    /// Lock file path (defaults to the XDG runtime dir)
    #[serde(default)]
    pub lock_file: Option<PathBuf>,

    /// Keyboard layout settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Key repeat settings
    #[serde(default)]
    pub repeat: RepeatConfig,

    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serialize: true,
            lock_file: None,
            layout: LayoutConfig::default(),
            repeat: RepeatConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutConfig {
    /// Layouts in priority order, first is the primary
    #[serde(default = "default_layouts")]
    pub layouts: Vec<String>,

    /// Group switching option, always applied
    #[serde(default = "default_toggle_option")]
    pub toggle_option: String,

    /// Caps Lock / Escape swap option
    #[serde(default = "default_caps_escape_option")]
    pub caps_escape_option: String,

    /// vendor:product IDs that already swap Caps Lock and Escape in firmware
    #[serde(default = "default_firmware_swap_devices")]
    pub firmware_swap_devices: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layouts: default_layouts(),
            toggle_option: default_toggle_option(),
            caps_escape_option: default_caps_escape_option(),
            firmware_swap_devices: default_firmware_swap_devices(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RepeatConfig {
    /// Delay before repeat starts (ms)
    #[serde(default = "default_repeat_delay")]
    pub delay: u32,

    /// Repeats per second
    #[serde(default = "default_repeat_rate")]
    pub rate: u32,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            delay: default_repeat_delay(),
            rate: default_repeat_rate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_setxkbmap")]
    pub setxkbmap: String,

    #[serde(default = "default_xset")]
    pub xset: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            setxkbmap: default_setxkbmap(),
            xset: default_xset(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_layouts() -> Vec<String> {
    vec!["se".to_string(), "us".to_string()]
}

fn default_toggle_option() -> String {
    "grp:shifts_toggle".to_string()
}

fn default_caps_escape_option() -> String {
    "caps:swapescape".to_string()
}

fn default_firmware_swap_devices() -> Vec<String> {
    vec![FIRMWARE_SWAP_DEVICE.to_string()]
}

fn default_repeat_delay() -> u32 {
    200
}

fn default_repeat_rate() -> u32 {
    30
}

fn default_setxkbmap() -> String {
    "setxkbmap".to_string()
}

fn default_xset() -> String {
    "xset".to_string()
}

impl Config {
    /// Parse TOML configuration text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Load an explicitly requested config file. Missing or invalid is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load the first config file found in the standard locations.
    ///
    /// A file that can't be read or parsed is skipped with a warning, falling
    /// back to the defaults, so a broken config never leaves a keyboard
    /// unconfigured.
    pub fn load() -> Self {
        Self::load_first(&config_paths())
    }

    fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::load_from(path) {
                Ok(config) => {
                    log::debug!("Loaded configuration from {}", path.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("{:#}; using defaults", e);
                    return Self::default();
                }
            }
        }

        log::debug!("Using default configuration");
        Self::default()
    }

    /// Lock file path, falling back to the runtime or temp dir
    pub fn lock_path(&self) -> PathBuf {
        if let Some(path) = &self.lock_file {
            return path.clone();
        }
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(format!("{}.lock", APP_NAME))
    }
}

/// Config search order: user config dir first, then the system-wide file
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_NAME).join("config.toml"));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    paths
}
