//! Configuration management
//!
//! The library defaults are compile-time constants (`localhost:8008`, 24
//! knobs). `load_config` layers an optional config file and `KNOBS_*`
//! environment variables on top of them for the monitor binary.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::KnobError;

/// Number of knobs mirrored from the control surface proxy
pub const NUM_KNOBS: usize = 24;
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8008;

/// Base name of the optional config file (`knobs.toml`, `knobs.json`, ...)
const CONFIG_FILE_NAME: &str = "knobs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobClientConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Receive size and number of state slots
    #[serde(default = "default_num_knobs")]
    pub num_knobs: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_num_knobs() -> usize {
    NUM_KNOBS
}

impl Default for KnobClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            num_knobs: default_num_knobs(),
        }
    }
}

impl KnobClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_num_knobs(mut self, num_knobs: usize) -> Self {
        self.num_knobs = num_knobs;
        self
    }

    /// Checked by `load_config` and again by `KnobReader::start`. A zero-knob
    /// reader would read into an empty buffer and mistake every receive for EOF.
    pub fn validate(&self) -> std::result::Result<(), KnobError> {
        if self.num_knobs == 0 || self.num_knobs > u8::MAX as usize {
            return Err(KnobError::InvalidConfig(format!(
                "num_knobs must be between 1 and 255, got {}",
                self.num_knobs
            )));
        }
        if self.host.trim().is_empty() {
            return Err(KnobError::InvalidConfig("host must not be empty".into()));
        }
        Ok(())
    }

    /// `host:port` as handed to address resolution and shown in logs
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Get config directory (KNOBS_CONFIG_DIR, XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KNOBS_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/knob-client");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("knob-client");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/knob-client");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("knob-client");
        }
    }

    PathBuf::from(".")
}

pub fn load_config() -> Result<KnobClientConfig> {
    let config_dir = get_config_dir();

    let config = ::config::Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("num_knobs", NUM_KNOBS as i64)?
        .add_source(
            ::config::File::with_name(&config_dir.join(CONFIG_FILE_NAME).to_string_lossy())
                .required(false),
        )
        // KNOBS_HOST, KNOBS_PORT, KNOBS_NUM_KNOBS
        .add_source(
            ::config::Environment::with_prefix("KNOBS")
                .prefix_separator("_")
                .try_parsing(true),
        )
        .build()?;

    let config: KnobClientConfig = config.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
