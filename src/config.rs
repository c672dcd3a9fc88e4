// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider configuration.
//!
//! Settings come from an optional YAML file and from the environment. Environment
//! variables override the file so credentials never have to be written to disk.
//!
//! ```yaml
//! nios_host_url: https://gridmaster.example.com
//! nios_username: admin
//! nios_password: infoblox
//! wapi_version: v2.13.6
//! insecure_skip_verify: true
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_MAX_RETRY_ELAPSED_SECS, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS, DEFAULT_WAPI_VERSION,
    ENV_NIOS_HOST_URL, ENV_NIOS_PASSWORD, ENV_NIOS_USERNAME, ENV_NIOS_WAPI_VERSION,
};
use crate::errors::ConfigError;

/// Connection settings for the NIOS grid master.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub nios_host_url: String,
    #[serde(default)]
    pub nios_username: String,
    #[serde(default)]
    pub nios_password: String,
    #[serde(default = "default_wapi_version")]
    pub wapi_version: String,
    /// Accept self-signed grid master certificates
    #[serde(default)]
    pub insecure_skip_verify: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on time spent retrying one request; 0 disables retries
    #[serde(default = "default_max_retry_elapsed_secs")]
    pub max_retry_elapsed_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_wapi_version() -> String {
    DEFAULT_WAPI_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retry_elapsed_secs() -> u64 {
    DEFAULT_MAX_RETRY_ELAPSED_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            nios_host_url: String::new(),
            nios_username: String::new(),
            nios_password: String::new(),
            wapi_version: default_wapi_version(),
            insecure_skip_verify: false,
            timeout_secs: default_timeout_secs(),
            max_retry_elapsed_secs: default_max_retry_elapsed_secs(),
            page_size: default_page_size(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("nios_host_url", &self.nios_host_url)
            .field("nios_username", &self.nios_username)
            .field("nios_password", &"<redacted>")
            .field("wapi_version", &self.wapi_version)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retry_elapsed_secs", &self.max_retry_elapsed_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl ProviderConfig {
    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Override settings with any `NIOS_*` environment variables that are set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Override settings from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_NIOS_HOST_URL) {
            self.nios_host_url = url;
        }
        if let Some(username) = get(ENV_NIOS_USERNAME) {
            self.nios_username = username;
        }
        if let Some(password) = get(ENV_NIOS_PASSWORD) {
            self.nios_password = password;
        }
        if let Some(version) = get(ENV_NIOS_WAPI_VERSION) {
            self.wapi_version = version;
        }
        self
    }

    /// Check that every required setting is present and usable.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nios_host_url.is_empty() {
            return Err(ConfigError::Missing {
                setting: "nios_host_url",
                env_var: ENV_NIOS_HOST_URL,
            });
        }
        if !(self.nios_host_url.starts_with("http://") || self.nios_host_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid {
                setting: "nios_host_url",
                reason: format!("'{}' must start with http:// or https://", self.nios_host_url),
            });
        }
        if self.nios_username.is_empty() {
            return Err(ConfigError::Missing {
                setting: "nios_username",
                env_var: ENV_NIOS_USERNAME,
            });
        }
        if self.nios_password.is_empty() {
            return Err(ConfigError::Missing {
                setting: "nios_password",
                env_var: ENV_NIOS_PASSWORD,
            });
        }
        if !self.wapi_version.starts_with('v') {
            return Err(ConfigError::Invalid {
                setting: "wapi_version",
                reason: format!("'{}' must look like v2.13.6", self.wapi_version),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                setting: "page_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn max_retry_elapsed(&self) -> Duration {
        Duration::from_secs(self.max_retry_elapsed_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
