//! Resource provider registration
//!
//! A subscription has to register a resource provider (Storage, Caching, ...)
//! before it can use it. Registration is an idempotent action selected by the
//! `action` query parameter; a 409 answer means the provider is already in the
//! requested state and is reported as `false`, not as an error.

use crate::client::ServiceManagementClient;
use crate::error::{CoreError, Result};
use crate::transport::HttpMethod;
use crate::xml;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// HTTP status the endpoint uses for "already in that state"
const STATUS_CONFLICT: u16 = 409;

/// Registration state of a provider as reported by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationState {
    Registered,
    Unregistered,
}

impl std::fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationState::Registered => write!(f, "Registered"),
            RegistrationState::Unregistered => write!(f, "Unregistered"),
        }
    }
}

impl std::str::FromStr for RegistrationState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Registered" => Ok(RegistrationState::Registered),
            "Unregistered" => Ok(RegistrationState::Unregistered),
            other => Err(CoreError::UnknownState(other.to_string())),
        }
    }
}

/// One entry of a provider list response
///
/// Fields hold the element text verbatim; a missing element is an empty
/// string. Use [`ProviderResource::registration_state`] to interpret `state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub state: String,
}

impl ProviderResource {
    pub fn new(resource_type: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            state: state.into(),
        }
    }

    /// Interpret `state`, failing on anything but the two known literals
    pub fn registration_state(&self) -> Result<RegistrationState> {
        self.state.parse()
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.registration_state(), Ok(RegistrationState::Registered))
    }
}

/// Which way a registration action flips a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    Register,
    Unregister,
}

impl RegistrationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationAction::Register => "register",
            RegistrationAction::Unregister => "unregister",
        }
    }
}

impl std::fmt::Display for RegistrationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single register/unregister call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub subscription_id: String,
    pub resource_type: String,
    pub action: RegistrationAction,
}

impl RegistrationRequest {
    /// Build a request, rejecting an empty resource type
    pub fn new(
        subscription_id: impl Into<String>,
        resource_type: impl Into<String>,
        action: RegistrationAction,
    ) -> Result<Self> {
        let resource_type = resource_type.into();
        if resource_type.trim().is_empty() {
            return Err(CoreError::Validation(
                "Resource type must not be empty".to_string(),
            ));
        }
        Ok(Self {
            subscription_id: subscription_id.into(),
            resource_type,
            action,
        })
    }

    pub fn path(&self) -> String {
        action_path(&self.subscription_id, &self.resource_type, self.action)
    }
}

/// `/{subscription}/services/?serviceList=A,B&expandlist=ServiceResource`
pub fn list_path<S: AsRef<str>>(subscription_id: &str, resource_types: &[S]) -> String {
    let list = resource_types
        .iter()
        .map(|t| urlencoding::encode(t.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "/{}/services/?serviceList={}&expandlist=ServiceResource",
        urlencoding::encode(subscription_id),
        list
    )
}

/// `/{subscription}/services?service={type}&action={register|unregister}`
pub fn action_path(
    subscription_id: &str,
    resource_type: &str,
    action: RegistrationAction,
) -> String {
    format!(
        "/{}/services?service={}&action={}",
        urlencoding::encode(subscription_id),
        urlencoding::encode(resource_type),
        action
    )
}

/// Parse a provider list document
pub fn parse_provider_list(body: &str) -> Result<Vec<ProviderResource>> {
    let root = xml::parse_root(body, "Services")?;
    Ok(root
        .children_named("Service")
        .map(|service| ProviderResource {
            resource_type: service.child_text("Type"),
            state: service.child_text("State"),
        })
        .collect())
}

impl ServiceManagementClient {
    /// Fetch the registration state of `known_types`
    ///
    /// Entries come back in document order, without dedup.
    pub async fn list_resources<S: AsRef<str>>(
        &self,
        known_types: &[S],
    ) -> Result<Vec<ProviderResource>> {
        let path = list_path(self.subscription_id(), known_types);
        debug!("Listing {} resource providers", known_types.len());

        let response = self.send(HttpMethod::Get, path).await?.ensure_success()?;
        let resources = parse_provider_list(&response.body)?;

        debug!("Endpoint reported {} resource providers", resources.len());
        Ok(resources)
    }

    /// Register `resource_type`; `false` means it already was
    pub async fn register_resource_type(&self, resource_type: &str) -> Result<bool> {
        self.apply(RegistrationRequest::new(
            self.subscription_id(),
            resource_type,
            RegistrationAction::Register,
        )?)
        .await
    }

    /// Unregister `resource_type`; `false` means it already was
    pub async fn unregister_resource_type(&self, resource_type: &str) -> Result<bool> {
        self.apply(RegistrationRequest::new(
            self.subscription_id(),
            resource_type,
            RegistrationAction::Unregister,
        )?)
        .await
    }

    async fn apply(&self, request: RegistrationRequest) -> Result<bool> {
        let response = self.send(HttpMethod::Put, request.path()).await?;

        if response.status == STATUS_CONFLICT {
            info!(
                "{} {}: no change, provider already in requested state",
                request.action, request.resource_type
            );
            return Ok(false);
        }

        response.ensure_success()?;
        info!("{} {}: done", request.action, request.resource_type);
        Ok(true)
    }
}
