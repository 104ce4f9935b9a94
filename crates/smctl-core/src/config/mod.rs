//! Configuration and profile management for smctl
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! # Features
//!
//! - Multiple named profiles, one per subscription/endpoint
//! - Certificate or bearer-token authentication
//! - Secure token storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

pub mod config;
pub mod credential;
pub mod error;
pub mod polling;

// Re-export main types for convenience
pub use config::{Config, ENV_CERTIFICATE, ENV_TOKEN, Profile, ProfileAuth};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
pub use polling::PollingConfig;
