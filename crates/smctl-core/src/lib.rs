//! # smctl-core
//!
//! Library behind the `smctl` CLI: a small client for the Service Management
//! subscription endpoint.
//!
//! - [`ServiceManagementClient`] lists resource providers and flips their
//!   registration state ([`registration`]).
//! - [`register_missing`] registers every provider from a
//!   [`ResourceTypeCatalog`] that isn't registered yet ([`workflows`]).
//! - [`wait_for`] polls a long-running operation by tracking id until it
//!   finishes ([`operation`]).
//! - [`config`] holds profiles and credentials.
//!
//! All network access goes through the [`Transport`] trait;
//! [`HttpTransport`] is the reqwest implementation.
//!
//! ```rust,ignore
//! use smctl_core::{Credentials, HttpTransport, ServiceManagementClient, register_missing};
//! use std::sync::Arc;
//!
//! let transport = HttpTransport::new(
//!     "https://management.core.windows.net",
//!     Credentials::Token(token),
//! )?;
//! let client = ServiceManagementClient::with_new_session(Arc::new(transport), subscription_id);
//! let report = register_missing(&client, &["Storage", "CloudServices"]).await?;
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod progress;
pub mod registration;
pub mod transport;
pub mod workflows;
pub mod xml;

pub use catalog::ResourceTypeCatalog;
pub use client::{API_VERSION, DEFAULT_ENDPOINT, ServiceManagementClient};
pub use config::{Config, ConfigError, Profile, ProfileAuth};
pub use error::{CoreError, Result};
pub use operation::{
    OperationError, OperationState, OperationStatus, OperationStatusSource, PollPolicy, wait_for,
    wait_for_until,
};
pub use progress::{ProgressCallback, ProgressEvent};
pub use registration::{
    ProviderResource, RegistrationAction, RegistrationRequest, RegistrationState,
};
pub use transport::{Credentials, HttpMethod, HttpRequest, HttpResponse, HttpTransport, Transport};
pub use workflows::{
    RegistrationFailure, RegistrationReport, providers_to_register, register_missing,
};
