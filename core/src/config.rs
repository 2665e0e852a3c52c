//! Inspector configuration (spyglass.toml)
//!
//! Loading, saving, and defaults for inspector settings. Stored as TOML
//! next to the process working directory by default; out-of-range values
//! are clamped on load rather than rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Refresh interval clamp bounds, in milliseconds.
pub const MIN_REFRESH_MS: u64 = 250;
pub const MAX_REFRESH_MS: u64 = 5000;

/// Inspector configuration.
///
/// All user-tunable settings, serialized to/from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Object graph scan settings
    #[serde(default)]
    pub scan: ScanConfig,
    /// Overlay presentation settings
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Object graph scan configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether the timer rescans on its own (default: false, manual refresh)
    #[serde(default)]
    pub auto_refresh: bool,
    /// Milliseconds between automatic rescans (default: 2500, range: 250-5000)
    #[serde(default = "default_refresh_ms")]
    pub refresh_interval_ms: u64,
    /// Whether scans include inactive instances (default: false)
    #[serde(default)]
    pub include_inactive: bool,
}

/// Overlay presentation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Overlay visibility toggle key (default: F4)
    #[serde(default = "default_toggle_key")]
    pub toggle_key: String,
    /// Whether the overlay starts visible (default: false)
    #[serde(default)]
    pub start_visible: bool,
    /// Whether the log pane sticks to the newest line (default: true)
    #[serde(default = "default_log_auto_scroll")]
    pub log_auto_scroll: bool,
}

fn default_refresh_ms() -> u64 {
    2500
}
fn default_toggle_key() -> String {
    "F4".to_string()
}
fn default_log_auto_scroll() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_interval_ms: default_refresh_ms(),
            include_inactive: false,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            toggle_key: default_toggle_key(),
            start_visible: false,
            log_auto_scroll: default_log_auto_scroll(),
        }
    }
}

impl Config {
    /// Clamp out-of-range values in place.
    pub fn clamp(&mut self) {
        self.scan.refresh_interval_ms = self
            .scan
            .refresh_interval_ms
            .clamp(MIN_REFRESH_MS, MAX_REFRESH_MS);
    }
}

/// Default configuration path, relative to the working directory.
pub fn default_path() -> PathBuf {
    PathBuf::from("spyglass.toml")
}

/// Load configuration from `path`.
///
/// Returns clamped defaults if the file doesn't exist or cannot be parsed.
pub fn load_from(path: &Path) -> Config {
    let mut config: Config = std::fs::read_to_string(path)
        .ok()
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default();
    config.clamp();
    config
}

/// Save configuration to `path`, creating parent directories as needed.
pub fn save_to(config: &Config, path: &Path) -> std::io::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let config = Config::default();
        assert_eq!(config.scan.refresh_interval_ms, 2500);
        assert!(!config.scan.auto_refresh);
        assert!(!config.scan.include_inactive);
        assert_eq!(config.overlay.toggle_key, "F4");
        assert!(config.overlay.log_auto_scroll);
    }

    #[test]
    fn clamp_bounds_refresh_interval() {
        let mut config = Config::default();
        config.scan.refresh_interval_ms = 50;
        config.clamp();
        assert_eq!(config.scan.refresh_interval_ms, MIN_REFRESH_MS);

        config.scan.refresh_interval_ms = 60_000;
        config.clamp();
        assert_eq!(config.scan.refresh_interval_ms, MAX_REFRESH_MS);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[scan]\ninclude_inactive = true\n").unwrap();
        assert!(config.scan.include_inactive);
        assert!(!config.scan.auto_refresh);
        assert_eq!(config.scan.refresh_interval_ms, 2500);
        assert_eq!(config.overlay.toggle_key, "F4");
        assert!(config.overlay.log_auto_scroll);
    }

    #[test]
    fn load_from_missing_file_yields_defaults() {
        let config = load_from(Path::new("does/not/exist/spyglass.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.scan.refresh_interval_ms = 1000;
        config.overlay.start_visible = true;
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
