//! Runtime tunables, loaded from an optional TOML file.
//!
//! Every key is optional; anything missing takes the built-in default.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "COMMIT_CAT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub walk: WalkConfig,
    pub schedule: ScheduleConfig,
    pub reconcile: ReconcileConfig,
    pub messages: MessageConfig,
}

/// Sprite window geometry and visibility behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Logical window width; also the sprite width used for edge clamping.
    pub width: u32,
    pub height: u32,
    /// Used when the host cannot report the window position at startup.
    pub start_x: i32,
    pub start_y: i32,
    /// Hide the cat while another app is fullscreen.
    pub auto_hide_fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 100,
            start_x: 300,
            start_y: 400,
            auto_hide_fullscreen: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Base walk speed in pixels/second.
    pub speed: f32,
    /// Extra random speed per frame, uniform in [0, jitter).
    pub jitter: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            speed: 40.0,
            jitter: 20.0,
        }
    }
}

/// Day period bounds (local hours, 0-23).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub night_start: u32,
    pub night_end: u32,
    pub morning_end: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            night_start: 23,
            night_end: 6,
            morning_end: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub celebration_ms: u64,
    pub coding_minute_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            celebration_ms: 3_000,
            coding_minute_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Click reaction bubble.
    pub bubble_ms: u64,
    /// Bubble shown on a display state change.
    pub transition_ms: u64,
    /// "wheee~!" after a real drag.
    pub drag_ms: u64,
    pub chatter_interval_ms: u64,
    pub chatter_chance: f32,
    pub click_reset_ms: u64,
    pub emoji_revert_ms: u64,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            bubble_ms: 2_000,
            transition_ms: 2_500,
            drag_ms: 1_500,
            chatter_interval_ms: 8_000,
            chatter_chance: 0.15,
            click_reset_ms: 3_000,
            emoji_revert_ms: 2_000,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        for (name, hour) in [
            ("night_start", s.night_start),
            ("night_end", s.night_end),
            ("morning_end", s.morning_end),
        ] {
            if hour >= 24 {
                return Err(ConfigError::Invalid(format!(
                    "schedule.{name} must be an hour in 0..24, got {hour}"
                )));
            }
        }
        if s.morning_end <= s.night_end {
            return Err(ConfigError::Invalid(
                "schedule.morning_end must come after schedule.night_end".into(),
            ));
        }

        let m = &self.messages;
        if !(0.0..=1.0).contains(&m.chatter_chance) {
            return Err(ConfigError::Invalid(format!(
                "messages.chatter_chance must be in [0, 1], got {}",
                m.chatter_chance
            )));
        }
        for (name, ms) in [
            ("messages.bubble_ms", m.bubble_ms),
            ("messages.transition_ms", m.transition_ms),
            ("messages.drag_ms", m.drag_ms),
            ("messages.chatter_interval_ms", m.chatter_interval_ms),
            ("messages.click_reset_ms", m.click_reset_ms),
            ("messages.emoji_revert_ms", m.emoji_revert_ms),
            ("reconcile.celebration_ms", self.reconcile.celebration_ms),
            ("reconcile.coding_minute_ms", self.reconcile.coding_minute_ms),
        ] {
            if ms == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
            }
        }

        for (name, value) in [("walk.speed", self.walk.speed), ("walk.jitter", self.walk.jitter)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Where the config file lives: `$COMMIT_CAT_CONFIG`, else the platform config dir.
pub fn default_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("", "", "commit-cat").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load the config file if present. Never fails: problems fall back to defaults.
pub fn load_or_default() -> Config {
    let Some(path) = default_path() else {
        log::info!("No config directory available, using defaults");
        return Config::default();
    };
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Config::default();
    }
    match Config::load(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Ignoring config {}: {e}", path.display());
            Config::default()
        }
    }
}
