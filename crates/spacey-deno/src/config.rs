// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.
//!
//! Sources, later ones winning: built-in defaults, the user file
//! `<config dir>/spacey/deno.toml`, the project file `./spacey-deno.toml`,
//! then `SPACEY_DENO_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::default_cache_dir;
use crate::error::{LoaderError, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SPACEY_DENO_";

/// Project-local configuration file name
pub const PROJECT_CONFIG_FILE: &str = "spacey-deno.toml";

/// Configuration for module loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Content cache directory
    pub cache_dir: Option<PathBuf>,

    /// Deadline for one network fetch, in seconds
    pub fetch_timeout_secs: u64,

    /// Connect deadline, in seconds
    pub connect_timeout_secs: u64,

    /// Number of network fetches allowed in flight
    pub max_concurrent_fetches: usize,

    /// HTTP user agent
    pub user_agent: String,

    /// Log every capability access through the tracing interceptor
    pub trace_capabilities: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            fetch_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_concurrent_fetches: num_cpus::get() * 2,
            user_agent: format!("spacey-deno/{}", crate::VERSION),
            trace_capabilities: false,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from default locations.
    pub fn load() -> Result<Self> {
        let mut config = LoaderConfig::default();

        if let Some(user_config_path) = user_config_path() {
            if user_config_path.exists() {
                config.merge_from_file(&user_config_path)?;
            }
        }

        let project_config = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            config.merge_from_file(&project_config)?;
        }

        config.merge_from_env(std::env::vars())?;

        Ok(config)
    }

    /// Merge settings from a TOML file. Unknown keys are ignored.
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;
        let table: toml::Table = content
            .parse()
            .map_err(|e| LoaderError::Config(format!("{}: {}", path.display(), e)))?;

        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            self.set(&key, &value)
                .map_err(|e| LoaderError::Config(format!("{}: {}", path.display(), e)))?;
        }
        Ok(())
    }

    /// Merge `SPACEY_DENO_*` variables from an environment listing.
    pub fn merge_from_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                self.set(&config_key.to_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| LoaderError::Config(format!("invalid value '{}' for {}", value, key)))
        }

        match key {
            "cache_dir" => self.cache_dir = Some(PathBuf::from(value)),
            "fetch_timeout_secs" => self.fetch_timeout_secs = parse(key, value)?,
            "connect_timeout_secs" => self.connect_timeout_secs = parse(key, value)?,
            "max_concurrent_fetches" => {
                let n: usize = parse(key, value)?;
                if n == 0 {
                    return Err(LoaderError::Config(
                        "max_concurrent_fetches must be at least 1".into(),
                    ));
                }
                self.max_concurrent_fetches = n;
            }
            "user_agent" => self.user_agent = value.to_string(),
            "trace_capabilities" => self.trace_capabilities = parse(key, value)?,
            _ => {}
        }
        Ok(())
    }

    /// Get the cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Deadline for one network fetch.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Connect deadline.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Get the user config path.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spacey").join("deno.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.max_concurrent_fetches >= 2);
        assert!(config.user_agent.starts_with("spacey-deno/"));
        assert!(!config.trace_capabilities);
        assert!(config.cache_dir().ends_with("spacey/deno"));
    }

    #[test]
    fn test_merge_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deno.toml");
        std::fs::write(
            &path,
            "cache_dir = \"/tmp/spacey-cache\"\nfetch_timeout_secs = 5\ntrace_capabilities = true\nunknown = 1\n",
        )
        .unwrap();

        let mut config = LoaderConfig::default();
        config.merge_from_file(&path).unwrap();
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/spacey-cache"));
        assert_eq!(config.fetch_timeout_secs, 5);
        assert!(config.trace_capabilities);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deno.toml");
        std::fs::write(&path, "fetch_timeout_secs = \"soon\"\n").unwrap();

        let err = LoaderConfig::default().merge_from_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);

        std::fs::write(&path, "this is not toml").unwrap();
        assert!(LoaderConfig::default().merge_from_file(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LoaderConfig::default();
        config
            .merge_from_env(vec![
                ("SPACEY_DENO_MAX_CONCURRENT_FETCHES".to_string(), "3".to_string()),
                ("SPACEY_DENO_USER_AGENT".to_string(), "probe".to_string()),
                ("PATH".to_string(), "/bin".to_string()),
            ])
            .unwrap();
        assert_eq!(config.max_concurrent_fetches, 3);
        assert_eq!(config.user_agent, "probe");

        let zero = vec![("SPACEY_DENO_MAX_CONCURRENT_FETCHES".to_string(), "0".to_string())];
        assert!(config.merge_from_env(zero).is_err());
    }
}
