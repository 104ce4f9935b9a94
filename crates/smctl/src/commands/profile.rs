//! Profile management command implementations

use colored::Colorize;
use comfy_table::Table;
use smctl_core::config::{CredentialStore, PollingConfig};
use smctl_core::{Config, DEFAULT_ENDPOINT, Profile, ProfileAuth};
use tracing::{debug, info};

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{Result, SmctlError};
use crate::output::print_output;

pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<()> {
    match profile_cmd {
        ProfileCommands::List => handle_list(conn_mgr, output_format),
        ProfileCommands::Path => handle_path(conn_mgr, output_format),
        ProfileCommands::Show { name } => handle_show(conn_mgr, name, output_format),
        ProfileCommands::Set {
            name,
            subscription_id,
            endpoint,
            certificate,
            token,
            #[cfg(feature = "secure-storage")]
            use_keyring,
            poll_interval,
            max_attempts,
        } => {
            #[cfg(feature = "secure-storage")]
            let use_keyring = *use_keyring;
            #[cfg(not(feature = "secure-storage"))]
            let use_keyring = false;

            let request = SetRequest {
                name,
                subscription_id,
                endpoint: endpoint.as_deref(),
                certificate: certificate.as_deref(),
                token: token.as_deref(),
                use_keyring,
                poll_interval: *poll_interval,
                max_attempts: *max_attempts,
            };
            handle_set(conn_mgr, request)
        }
        ProfileCommands::Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

/// Token shown as stored: keyring references as-is, plain tokens masked
fn mask_secret(value: &str) -> String {
    if CredentialStore::is_keyring_reference(value) {
        return value.to_string();
    }
    if value.chars().count() > 4 {
        format!("{}***", value.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

fn profile_json(name: &str, profile: &Profile, is_default: bool) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "name": name,
        "subscription_id": profile.subscription_id,
        "endpoint": profile.endpoint,
        "auth": profile.auth.kind(),
        "is_default": is_default,
        "polling": profile.polling(),
    });
    match &profile.auth {
        ProfileAuth::Certificate { certificate } => {
            obj["certificate"] = serde_json::json!(certificate);
        }
        ProfileAuth::Token { token } => {
            obj["token"] = serde_json::json!(mask_secret(token));
        }
    }
    obj
}

fn config_path_for(conn_mgr: &ConnectionManager) -> Option<std::path::PathBuf> {
    conn_mgr
        .config_path
        .clone()
        .or_else(|| Config::config_path().ok())
}

/// Configuration as written on disk, `${VAR}` references unexpanded
///
/// Profile edits start from this so saving does not write the environment's
/// values into the file.
fn editable_config(conn_mgr: &ConnectionManager) -> Result<Config> {
    let path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    Ok(Config::load_raw_from_path(&path)?)
}

fn handle_list(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let profiles = conn_mgr.config.list_profiles();
    let default = conn_mgr.config.default_profile.as_deref();
    debug!("Found {} profiles", profiles.len());

    if !output_format.is_human() {
        let list: Vec<_> = profiles
            .iter()
            .map(|(name, profile)| profile_json(name, profile, default == Some(name.as_str())))
            .collect();
        let config_path = config_path_for(conn_mgr).map(|p| p.display().to_string());
        return print_output(
            serde_json::json!({
                "config_path": config_path,
                "profiles": list,
                "count": profiles.len(),
            }),
            output_format,
        );
    }

    if let Some(path) = config_path_for(conn_mgr) {
        println!("Configuration file: {}", path.display());
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'smctl profile set' to create a profile.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Subscription", "Endpoint", "Auth"]);
    for (name, profile) in &profiles {
        let display_name = if default == Some(name.as_str()) {
            format!("{} {}", name.bold().cyan(), "(default)".green())
        } else {
            name.bold().cyan().to_string()
        };
        table.add_row(vec![
            display_name,
            profile.subscription_id.clone(),
            profile.endpoint.clone(),
            profile.auth.kind().to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn handle_path(conn_mgr: &ConnectionManager, output_format: OutputFormat) -> Result<()> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if output_format.is_human() {
        println!("{}", config_path.display());
        return Ok(());
    }
    print_output(
        serde_json::json!({ "config_path": config_path.display().to_string() }),
        output_format,
    )
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> Result<()> {
    let profile = conn_mgr
        .config
        .profiles
        .get(name)
        .ok_or_else(|| SmctlError::ProfileNotFound {
            name: name.to_string(),
        })?;
    let is_default = conn_mgr.config.default_profile.as_deref() == Some(name);

    if !output_format.is_human() {
        return print_output(profile_json(name, profile, is_default), output_format);
    }

    println!("Profile: {}", name.bold());
    if is_default {
        println!("Default: {}", "yes".green());
    }
    println!("Subscription: {}", profile.subscription_id);
    println!("Endpoint: {}", profile.endpoint);
    match &profile.auth {
        ProfileAuth::Certificate { certificate } => println!("Certificate: {}", certificate),
        ProfileAuth::Token { token } => println!("Token: {}", mask_secret(token)),
    }
    let polling = profile.polling();
    println!(
        "Polling: every {}s, up to {} attempts",
        polling.interval_secs, polling.max_attempts
    );
    Ok(())
}

/// Arguments of `profile set`
struct SetRequest<'a> {
    name: &'a str,
    subscription_id: &'a str,
    endpoint: Option<&'a str>,
    certificate: Option<&'a str>,
    token: Option<&'a str>,
    use_keyring: bool,
    poll_interval: Option<u64>,
    max_attempts: Option<u32>,
}

fn build_profile(request: &SetRequest<'_>, store: &CredentialStore) -> Result<Profile> {
    if request.subscription_id.trim().is_empty() {
        return Err(SmctlError::InvalidInput {
            message: "Subscription id must not be empty".to_string(),
        });
    }

    let auth = match (request.certificate, request.token) {
        (Some(certificate), None) => ProfileAuth::Certificate {
            certificate: certificate.to_string(),
        },
        (None, Some(token)) => {
            let stored = if request.use_keyring {
                if store.storage_backend() != "keyring" {
                    return Err(SmctlError::Configuration(
                        "OS keyring is not available; store the token without --use-keyring"
                            .to_string(),
                    ));
                }
                let entry = CredentialStore::entry_name(request.name, "token");
                let reference = store.store_credential(&entry, token)?;
                println!("Token stored securely in OS keyring");
                reference
            } else {
                token.to_string()
            };
            ProfileAuth::Token { token: stored }
        }
        _ => {
            return Err(SmctlError::InvalidInput {
                message: "Give exactly one of --certificate or --token".to_string(),
            });
        }
    };

    let mut profile = Profile::new(request.subscription_id, auth);
    profile.endpoint = request.endpoint.unwrap_or(DEFAULT_ENDPOINT).to_string();
    if request.poll_interval.is_some() || request.max_attempts.is_some() {
        let defaults = PollingConfig::default();
        profile.polling = Some(PollingConfig {
            interval_secs: request.poll_interval.unwrap_or(defaults.interval_secs),
            max_attempts: request.max_attempts.unwrap_or(defaults.max_attempts),
        });
        profile.polling().to_policy().validate()?;
    }
    Ok(profile)
}

fn handle_set(conn_mgr: &ConnectionManager, request: SetRequest<'_>) -> Result<()> {
    debug!("Setting profile: {}", request.name);

    let store = if request.use_keyring {
        CredentialStore::new()
    } else {
        CredentialStore::plaintext()
    };
    let profile = build_profile(&request, &store)?;

    let mut config = editable_config(conn_mgr)?;
    let is_first = config.profiles.is_empty();
    config.set_profile(request.name.to_string(), profile);
    if is_first && config.default_profile.is_none() {
        config.default_profile = Some(request.name.to_string());
        println!("Set '{}' as the default profile.", request.name);
    }

    crate::connection::save_config_to(&config, conn_mgr.config_path.as_deref())?;
    println!("Profile '{}' saved successfully.", request.name);
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> Result<()> {
    debug!("Removing profile: {}", name);

    let mut config = editable_config(conn_mgr)?;
    let was_default = config.default_profile.as_deref() == Some(name);
    let removed = config
        .remove_profile(name)
        .ok_or_else(|| SmctlError::ProfileNotFound {
            name: name.to_string(),
        })?;

    if let ProfileAuth::Token { token } = &removed.auth
        && CredentialStore::is_keyring_reference(token)
    {
        CredentialStore::new().delete_credential(token)?;
        debug!("Deleted keyring entry for profile '{}'", name);
    }

    crate::connection::save_config_to(&config, conn_mgr.config_path.as_deref())?;
    if was_default {
        println!("Default profile cleared.");
    }
    println!("Profile '{}' removed successfully.", name);
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> Result<()> {
    let mut config = editable_config(conn_mgr)?;
    if !config.profiles.contains_key(name) {
        return Err(SmctlError::ProfileNotFound {
            name: name.to_string(),
        });
    }

    config.default_profile = Some(name.to_string());
    crate::connection::save_config_to(&config, conn_mgr.config_path.as_deref())?;
    println!("Default profile set to '{}'.", name);
    Ok(())
}
