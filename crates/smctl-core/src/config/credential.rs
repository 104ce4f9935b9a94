//! Secret resolution for profile credentials
//!
//! A profile value is one of:
//! - a plain value, used as-is
//! - `keyring:<entry>`, looked up in the OS keyring (`secure-storage` feature)
//!
//! and an environment variable, when set, wins over both.

use super::error::{ConfigError, Result};
use std::env;

/// Prefix that marks a value as a keyring reference
pub const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "smctl";

/// Where new secrets are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    /// OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Directly in the config file
    Plaintext,
}

/// Reads and writes profile secrets
#[derive(Debug, Clone)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Keyring-backed when the feature is on and a keyring answers
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            let available = keyring::Entry::new(SERVICE_NAME, "__probe__")
                .map(|entry| {
                    let _ = entry.get_password();
                })
                .is_ok();
            if available {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self::plaintext()
    }

    /// Store that never touches the keyring
    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    pub fn storage(&self) -> CredentialStorage {
        self.storage
    }

    /// Name of the backend, for display
    pub fn storage_backend(&self) -> &'static str {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => "keyring",
            CredentialStorage::Plaintext => "plaintext",
        }
    }

    /// Keyring entry name for a profile's secret
    pub fn entry_name(profile: &str, field: &str) -> String {
        format!("{}-{}", profile, field)
    }

    /// Persist `value` and return what should be written to the config file
    pub fn store_credential(&self, entry: &str, value: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let kr = keyring::Entry::new(SERVICE_NAME, entry)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                kr.set_password(value).map_err(|e| {
                    ConfigError::KeyringError(format!("Failed to store '{}': {}", entry, e))
                })?;
                Ok(format!("{}{}", KEYRING_PREFIX, entry))
            }
            CredentialStorage::Plaintext => {
                let _ = entry;
                Ok(value.to_string())
            }
        }
    }

    /// Resolve a config value to the secret it stands for
    ///
    /// Resolution order: `env_var` if set, then keyring reference, then the
    /// value itself.
    pub fn get_credential(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(from_env) = env::var(var)
        {
            return Ok(from_env);
        }

        let Some(entry) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            let kr = keyring::Entry::new(SERVICE_NAME, entry)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            kr.get_password().map_err(|e| {
                ConfigError::KeyringError(format!("Failed to read '{}' from keyring: {}", entry, e))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "'{}' is stored in the keyring but smctl was built without secure-storage",
                entry
            )))
        }
    }

    /// Remove a keyring entry; missing entries are fine
    pub fn delete_credential(&self, value: &str) -> Result<()> {
        let Some(entry) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(());
        };

        #[cfg(feature = "secure-storage")]
        {
            let kr = keyring::Entry::new(SERVICE_NAME, entry)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            match kr.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(ConfigError::KeyringError(format!(
                    "Failed to delete '{}': {}",
                    entry, e
                ))),
            }
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            let _ = entry;
            Ok(())
        }
    }

    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_value_passes_through() {
        let store = CredentialStore::plaintext();
        assert_eq!(store.get_credential("my-token", None).unwrap(), "my-token");
        assert_eq!(store.storage_backend(), "plaintext");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_override() {
        unsafe {
            env::set_var("SMCTL_TEST_CREDENTIAL", "env-value");
        }

        let store = CredentialStore::plaintext();
        let result = store
            .get_credential("config-value", Some("SMCTL_TEST_CREDENTIAL"))
            .unwrap();
        assert_eq!(result, "env-value");

        unsafe {
            env::remove_var("SMCTL_TEST_CREDENTIAL");
        }

        let result = store
            .get_credential("config-value", Some("SMCTL_TEST_CREDENTIAL"))
            .unwrap();
        assert_eq!(result, "config-value");
    }

    #[test]
    fn test_keyring_reference_detection() {
        assert!(CredentialStore::is_keyring_reference("keyring:prod-token"));
        assert!(!CredentialStore::is_keyring_reference("prod-token"));
        assert!(!CredentialStore::is_keyring_reference(""));
    }

    #[test]
    fn test_plaintext_store_returns_value() {
        let store = CredentialStore::plaintext();
        let stored = store
            .store_credential(&CredentialStore::entry_name("prod", "token"), "abc")
            .unwrap();
        assert_eq!(stored, "abc");
        assert!(store.delete_credential(&stored).is_ok());
    }

    #[cfg(not(feature = "secure-storage"))]
    #[test]
    fn test_keyring_reference_without_feature_errors() {
        let store = CredentialStore::plaintext();
        let err = store.get_credential("keyring:prod-token", None).unwrap_err();
        assert!(err.to_string().contains("secure-storage"));
    }

    #[cfg(feature = "secure-storage")]
    #[test]
    #[ignore = "Requires keyring service to be available"]
    fn test_keyring_round_trip() {
        let store = CredentialStore::new();
        let reference = store.store_credential("smctl-test-entry", "value").unwrap();
        assert!(reference.starts_with(KEYRING_PREFIX));
        assert_eq!(store.get_credential(&reference, None).unwrap(), "value");
        store.delete_credential(&reference).unwrap();
    }
}
