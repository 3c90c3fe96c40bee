//! Emulator configuration
//!
//! Loaded from YAML. Every field has a default, so an empty document is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logger::LogLevel;
use crate::process::pid_alloc::MAX_PID;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Logging section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level emitted unless `RUST_LOG` overrides it
    pub level: LogLevel,
}

/// Top-level emulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Pid of the root process. Its exit shuts the emulator down.
    pub init_pid: u32,
    /// Highest pid handed out by the allocator
    pub max_pid: u32,
    /// Host stack size for each guest process thread (bytes)
    pub thread_stack_size: usize,
    /// Host thread names are `<prefix>-<pid>`
    pub thread_name_prefix: String,
    /// Workers forked by the demo init program in the `nexa-emu` binary
    pub demo_children: u32,
    pub logging: LoggingConfig,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            init_pid: 1,
            max_pid: 32767,
            thread_stack_size: 256 * 1024,
            thread_name_prefix: "guest".to_string(),
            demo_children: 3,
            logging: LoggingConfig::default(),
        }
    }
}

impl EmulatorConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EmulatorConfig = if content.trim().is_empty() {
            EmulatorConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.init_pid == 0 {
            return Err(ConfigError::Invalid("init_pid must be positive".to_string()));
        }
        if self.max_pid as u64 > MAX_PID {
            return Err(ConfigError::Invalid(format!(
                "max_pid {} exceeds the allocator limit {}",
                self.max_pid, MAX_PID
            )));
        }
        if self.init_pid > self.max_pid {
            return Err(ConfigError::Invalid(format!(
                "init_pid {} is above max_pid {}",
                self.init_pid, self.max_pid
            )));
        }
        Ok(())
    }
}
