use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the settings file inside the user's config directory.
pub const CONFIG_FILE_NAME: &str = "luci_control.json";

const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

// Settings loaded from JSON at startup, never written with session state
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default = "default_driver_library")] // Library looked up by the OS loader
    pub driver_library: String,
    #[serde(default = "default_poll_interval")] // 0 disables device change polling
    pub poll_interval_ms: u64,
}

fn default_driver_library() -> String {
    libloading::library_filename("LUCI_10")
        .to_string_lossy()
        .into_owned()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            driver_library: default_driver_library(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl ConfigData {
    /// Driver library to load, a command line path taking precedence.
    pub fn driver_path(&self, cli_override: Option<&Path>) -> PathBuf {
        match cli_override {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(&self.driver_library),
        }
    }

    /// Device change poll interval, a command line value taking precedence.
    pub fn poll_interval(&self, cli_override: Option<u64>) -> u64 {
        cli_override.unwrap_or(self.poll_interval_ms)
    }
}

/// Location of the settings file, falling back to the working directory.
pub fn config_path() -> String {
    let config_dir = dirs::config_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    format!("{}/{}", config_dir, CONFIG_FILE_NAME)
}
