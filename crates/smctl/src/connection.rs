//! Connection management for Service Management clients

use std::path::PathBuf;
use std::sync::Arc;

use smctl_core::config::{ENV_TOKEN, PollingConfig};
use smctl_core::{
    Config, Credentials, DEFAULT_ENDPOINT, HttpTransport, ResourceTypeCatalog,
    ServiceManagementClient,
};
use tracing::{debug, info, trace};

use crate::error::Result as CliResult;

/// Subscription id for environment-only use
const ENV_SUBSCRIPTION_ID: &str = "SMCTL_SUBSCRIPTION_ID";
/// Endpoint for environment-only use
const ENV_ENDPOINT: &str = "SMCTL_ENDPOINT";

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// When --config-file is given, environment variables are ignored so the
    /// file is the only source of truth.
    fn use_env_vars(&self) -> bool {
        self.config_path.is_none()
    }

    /// Subscription and token from the environment, if both are set and no
    /// profile was asked for
    fn env_credentials(&self, profile_name: Option<&str>) -> Option<(String, String, String)> {
        if !self.use_env_vars() || profile_name.is_some() {
            return None;
        }
        let subscription_id = std::env::var(ENV_SUBSCRIPTION_ID).ok()?;
        let token = std::env::var(ENV_TOKEN).ok()?;
        let endpoint =
            std::env::var(ENV_ENDPOINT).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Some((subscription_id, token, endpoint))
    }

    /// Create a client for the selected profile
    ///
    /// `SMCTL_SUBSCRIPTION_ID` + `SMCTL_TOKEN` (+ `SMCTL_ENDPOINT`) stand in for
    /// a profile when no `--profile` or `--config-file` was given.
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<ServiceManagementClient> {
        debug!("Creating Service Management client");
        trace!("Profile name: {:?}", profile_name);

        let (subscription_id, credentials, endpoint) =
            if let Some((subscription_id, token, endpoint)) = self.env_credentials(profile_name) {
                info!("Using subscription and token from environment variables");
                (subscription_id, Credentials::Token(token), endpoint)
            } else {
                let resolved = self.config.resolve_profile(profile_name)?;
                info!("Using profile: {}", resolved);

                let profile = self
                    .config
                    .profiles
                    .get(&resolved)
                    .ok_or(smctl_core::ConfigError::ProfileNotFound {
                        name: resolved.clone(),
                    })?;
                (
                    profile.subscription_id.clone(),
                    profile.resolve_credentials()?,
                    profile.endpoint.clone(),
                )
            };

        info!("Connecting to {} for subscription {}", endpoint, subscription_id);
        let transport = HttpTransport::new(&endpoint, credentials)?;
        let client =
            ServiceManagementClient::with_new_session(Arc::new(transport), subscription_id);
        debug!("Session id: {}", client.correlation_id());
        Ok(client)
    }

    /// Polling settings of the selected profile, defaults when running from
    /// the environment
    pub fn polling_config(&self, profile_name: Option<&str>) -> CliResult<PollingConfig> {
        if self.env_credentials(profile_name).is_some() {
            return Ok(PollingConfig::default());
        }
        let resolved = self.config.resolve_profile(profile_name)?;
        Ok(self
            .config
            .profiles
            .get(&resolved)
            .map(|p| p.polling())
            .unwrap_or_default())
    }

    /// Built-in provider types plus `known_resource_types` from the config
    pub fn catalog(&self) -> ResourceTypeCatalog {
        self.config.catalog()
    }
}

/// Write `config` to `path`, or to the default location
pub fn save_config_to(config: &Config, path: Option<&std::path::Path>) -> CliResult<()> {
    match path {
        Some(path) => config.save_to_path(path)?,
        None => config.save()?,
    }
    Ok(())
}
