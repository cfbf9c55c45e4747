//! Layered application configuration.
//!
//! Settings are merged with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <FILE>` or `config.toml` in the platform config
//!    directory (absent files are skipped)
//! 3. `FDEDUP_*` environment variables (e.g. `FDEDUP_MIN_SIZE=0`)
//! 4. Command-line flags ([`Config::apply_cli`])
//!
//! ```toml
//! min_size = 4096
//! max_size = 1073741824
//! apply = "report"
//! io_threads = 1
//! progress = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{ApplyMode, Cli};
use crate::duplicates::{DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE};

/// Prefix of the environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "FDEDUP_";

/// Errors detected while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or deserialised.
    #[error("invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The size window is empty.
    #[error("minimum size {min} is greater than maximum size {max}")]
    InvalidSizeRange { min: u64, max: u64 },

    /// Hashing needs at least one thread.
    #[error("io_threads must be at least 1")]
    InvalidThreads,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Smallest file size considered (inclusive)
    pub min_size: u64,
    /// Largest file size considered (inclusive)
    pub max_size: u64,
    /// What to do with the duplicates found
    pub apply: ApplyMode,
    /// Hashing threads; 1 hashes sequentially
    pub io_threads: usize,
    /// Show progress bars
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            apply: ApplyMode::Report,
            io_threads: 1,
            progress: true,
        }
    }
}

impl Config {
    /// Default platform-specific configuration file, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "fdedup", "fdedup").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment with defaults, the TOML file (if any) and the environment.
    #[must_use]
    pub fn figment(explicit_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = explicit_path
            .map(Path::to_path_buf)
            .or_else(Self::default_path);
        if let Some(path) = file {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults, the config file and the environment.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a layer cannot be parsed.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))
                .into());
            }
        }
        Ok(Self::figment(explicit_path).extract()?)
    }

    /// Override settings with the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(max_size) = cli.max_size {
            self.max_size = max_size;
        }
        if let Some(apply) = cli.apply {
            self.apply = apply;
        }
        if let Some(io_threads) = cli.io_threads {
            self.io_threads = io_threads;
        }
        if cli.no_progress || cli.quiet {
            self.progress = false;
        }
    }

    /// Check the merged settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the size window is empty or `io_threads` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_size > self.max_size {
            return Err(ConfigError::InvalidSizeRange {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        Ok(())
    }
}
