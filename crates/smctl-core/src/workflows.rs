//! Multi-step registration workflows
//!
//! [`register_missing`] lists the known providers, works out which are not
//! registered yet and registers all of them concurrently. Each registration
//! stands alone: one failing provider does not stop or undo the others.

use crate::client::ServiceManagementClient;
use crate::error::Result;
use crate::registration::ProviderResource;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Providers in `known` that `listed` does not report as Registered
///
/// Providers missing from `listed` and providers with an unrecognized state
/// both count as needing registration.
pub fn providers_to_register<S: AsRef<str>>(
    known: &[S],
    listed: &[ProviderResource],
) -> BTreeSet<String> {
    let registered: BTreeSet<&str> = listed
        .iter()
        .filter(|p| p.is_registered())
        .map(|p| p.resource_type.as_str())
        .collect();

    known
        .iter()
        .map(|t| t.as_ref())
        .filter(|t| !registered.contains(t))
        .map(str::to_string)
        .collect()
}

/// A provider whose registration call failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationFailure {
    pub resource_type: String,
    pub error: String,
}

/// Outcome of a [`register_missing`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    /// Registered by this pass
    pub registered: Vec<String>,
    /// Endpoint answered 409, somebody else got there first
    pub already_registered: Vec<String>,
    pub failed: Vec<RegistrationFailure>,
}

impl RegistrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Register every provider in `known` that is not registered yet
///
/// Only a failure of the initial list call is an error; per-provider
/// failures land in [`RegistrationReport::failed`].
pub async fn register_missing<S: AsRef<str>>(
    client: &ServiceManagementClient,
    known: &[S],
) -> Result<RegistrationReport> {
    let listed = client.list_resources(known).await?;
    let pending = providers_to_register(known, &listed);

    if pending.is_empty() {
        info!("All {} known providers already registered", known.len());
        return Ok(RegistrationReport::default());
    }
    info!("Registering {} providers: {:?}", pending.len(), pending);

    let outcomes = join_all(pending.iter().map(|resource_type| async move {
        (
            resource_type.clone(),
            client.register_resource_type(resource_type).await,
        )
    }))
    .await;

    let mut report = RegistrationReport::default();
    for (resource_type, outcome) in outcomes {
        match outcome {
            Ok(true) => report.registered.push(resource_type),
            Ok(false) => report.already_registered.push(resource_type),
            Err(e) => {
                warn!("Failed to register {}: {}", resource_type, e);
                report.failed.push(RegistrationFailure {
                    resource_type,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
