//! Configuration management for smctl
//!
//! Configuration is stored in TOML with one named profile per subscription.
//! `${VAR}` and `${VAR:-default}` references are expanded on load.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::PollingConfig;
use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::catalog::ResourceTypeCatalog;
use crate::client::DEFAULT_ENDPOINT;
use crate::transport::Credentials;

/// Environment variable that overrides a profile's bearer token
pub const ENV_TOKEN: &str = "SMCTL_TOKEN";
/// Environment variable that overrides a profile's certificate path
pub const ENV_CERTIFICATE: &str = "SMCTL_CERTIFICATE";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Provider types to manage in addition to the built-in catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_resource_types: Vec<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// One subscription on one management endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub subscription_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Authentication (flattened into the profile)
    #[serde(flatten)]
    pub auth: ProfileAuth,
    /// Polling overrides for `operation wait`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollingConfig>,
}

/// How a profile authenticates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ProfileAuth {
    /// PEM file with management certificate and key
    Certificate { certificate: String },
    /// Bearer token, plain or `keyring:` reference
    Token { token: String },
}

impl ProfileAuth {
    pub fn kind(&self) -> &'static str {
        match self {
            ProfileAuth::Certificate { .. } => "certificate",
            ProfileAuth::Token { .. } => "token",
        }
    }
}

impl Profile {
    pub fn new(subscription_id: impl Into<String>, auth: ProfileAuth) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            endpoint: default_endpoint(),
            auth,
            polling: None,
        }
    }

    /// Resolve the profile's auth into transport credentials
    ///
    /// `SMCTL_TOKEN` / `SMCTL_CERTIFICATE` override the stored value of the
    /// matching kind; keyring references are looked up.
    pub fn resolve_credentials(&self) -> Result<Credentials> {
        let store = CredentialStore::new();
        match &self.auth {
            ProfileAuth::Certificate { certificate } => {
                let path = store
                    .get_credential(certificate, Some(ENV_CERTIFICATE))
                    .map_err(|e| {
                        ConfigError::CredentialError(format!(
                            "Failed to resolve certificate path: {}",
                            e
                        ))
                    })?;
                let expanded = shellexpand::tilde(&path).into_owned();
                Ok(Credentials::Certificate(PathBuf::from(expanded)))
            }
            ProfileAuth::Token { token } => {
                let token = store.get_credential(token, Some(ENV_TOKEN)).map_err(|e| {
                    ConfigError::CredentialError(format!("Failed to resolve token: {}", e))
                })?;
                Ok(Credentials::Token(token))
            }
        }
    }

    /// Polling settings, falling back to the defaults
    pub fn polling(&self) -> PollingConfig {
        self.polling.clone().unwrap_or_default()
    }
}

impl Config {
    /// Pick the profile to use
    ///
    /// An explicit name must exist. Otherwise the default profile is used,
    /// or the only profile if there is exactly one.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            return if self.profiles.contains_key(name) {
                Ok(name.to_string())
            } else {
                Err(ConfigError::ProfileNotFound {
                    name: name.to_string(),
                })
            };
        }

        if let Some(name) = &self.default_profile {
            return if self.profiles.contains_key(name) {
                Ok(name.clone())
            } else {
                Err(ConfigError::ProfileNotFound { name: name.clone() })
            };
        }

        let mut names = self.profiles.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.clone()),
            (None, _) => Err(ConfigError::NoProfiles {
                suggestion: "Use 'smctl profile set' to create a profile.".to_string(),
            }),
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousProfile {
                suggestion: "Several profiles exist and none is the default. \
                    Pass --profile or run 'smctl profile default <name>'."
                    .to_string(),
            }),
        }
    }

    /// Built-in provider types plus the configured extras
    pub fn catalog(&self) -> ResourceTypeCatalog {
        ResourceTypeCatalog::default().with_types(&self.known_resource_types)
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let content = Self::read_content(config_path)?;
        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Load configuration without expanding `${VAR}` references
    ///
    /// Use this when the configuration is going to be saved again, so
    /// references stay references instead of becoming their current values.
    pub fn load_raw_from_path(config_path: &Path) -> Result<Self> {
        let content = Self::read_content(config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// File contents, empty for a missing file
    fn read_content(config_path: &Path) -> Result<String> {
        if !config_path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS `~/.config/smctl/config.toml` is preferred when that directory
    /// exists, otherwise the platform path is used:
    ///
    /// - Linux: `~/.config/smctl/config.toml`
    /// - macOS: `~/Library/Application Support/com.smctl.smctl/config.toml`
    /// - Windows: `%APPDATA%\smctl\smctl\config.toml`
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_dir = base_dirs.home_dir().join(".config").join("smctl");
                if linux_style_dir.exists() {
                    return Ok(linux_style_dir.join("config.toml"));
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "smctl", "smctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as written so profiles
    /// that are not in use don't break loading.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
