//! Resource provider commands

use colored::Colorize;
use comfy_table::Table;
use serde::Serialize;
use smctl_core::{
    ProviderResource, RegistrationReport, ResourceTypeCatalog, providers_to_register,
    register_missing,
};
use tracing::{debug, info};

use crate::cli::{OutputFormat, ProviderCommands};
use crate::connection::ConnectionManager;
use crate::error::{Result, SmctlError};
use crate::output::print_output;

pub async fn handle_provider_command(
    command: &ProviderCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    match command {
        ProviderCommands::List { types } => {
            handle_list(conn_mgr, profile, types, output_format).await
        }
        ProviderCommands::Register { resource_type } => {
            handle_action(conn_mgr, profile, resource_type, true, output_format).await
        }
        ProviderCommands::Unregister { resource_type } => {
            handle_action(conn_mgr, profile, resource_type, false, output_format).await
        }
        ProviderCommands::Sync { types, dry_run } => {
            handle_sync(conn_mgr, profile, types, *dry_run, output_format).await
        }
    }
}

/// `--type` replaces the catalog for `list`
fn list_types(conn_mgr: &ConnectionManager, types: &[String]) -> Vec<String> {
    if types.is_empty() {
        conn_mgr.catalog().to_vec()
    } else {
        ResourceTypeCatalog::from_types(types).to_vec()
    }
}

/// `--type` extends the catalog for `sync`
fn sync_types(conn_mgr: &ConnectionManager, types: &[String]) -> Vec<String> {
    conn_mgr.catalog().with_types(types).to_vec()
}

async fn handle_list(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    types: &[String],
    output_format: OutputFormat,
) -> Result<()> {
    let client = conn_mgr.create_client(profile)?;
    let types = list_types(conn_mgr, types);
    debug!("Listing {} provider types", types.len());

    let resources = client.list_resources(&types).await?;

    if output_format.is_human() {
        print_provider_table(&resources);
        return Ok(());
    }
    print_output(&resources, output_format)
}

fn print_provider_table(resources: &[ProviderResource]) {
    if resources.is_empty() {
        println!("No providers returned.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Type", "State"]);
    for resource in resources {
        let state = match resource.registration_state() {
            Ok(state) => state.to_string(),
            Err(_) if resource.state.is_empty() => "(missing)".to_string(),
            Err(_) => format!("{} (unknown)", resource.state),
        };
        table.add_row(vec![resource.resource_type.clone(), state]);
    }
    println!("{}", table);
}

#[derive(Serialize)]
struct ActionOutput<'a> {
    resource_type: &'a str,
    action: &'static str,
    changed: bool,
}

async fn handle_action(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    resource_type: &str,
    register: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let client = conn_mgr.create_client(profile)?;

    let changed = if register {
        client.register_resource_type(resource_type).await?
    } else {
        client.unregister_resource_type(resource_type).await?
    };
    let action = if register { "register" } else { "unregister" };
    info!("{} {}: changed={}", action, resource_type, changed);

    if output_format.is_human() {
        let done = if register { "registered" } else { "unregistered" };
        if changed {
            println!("{} {}", resource_type.bold(), done.green());
        } else {
            println!("{} already {}", resource_type.bold(), done);
        }
        return Ok(());
    }

    print_output(
        ActionOutput {
            resource_type,
            action,
            changed,
        },
        output_format,
    )
}

#[derive(Serialize)]
struct DryRunOutput {
    dry_run: bool,
    would_register: Vec<String>,
}

async fn handle_sync(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    types: &[String],
    dry_run: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let client = conn_mgr.create_client(profile)?;
    let known = sync_types(conn_mgr, types);

    if dry_run {
        let listed = client.list_resources(&known).await?;
        let pending: Vec<String> = providers_to_register(&known, &listed).into_iter().collect();

        if output_format.is_human() {
            if pending.is_empty() {
                println!("All {} known providers are registered.", known.len());
            } else {
                println!("Would register:");
                for resource_type in &pending {
                    println!("  {}", resource_type);
                }
            }
            return Ok(());
        }
        return print_output(
            DryRunOutput {
                dry_run: true,
                would_register: pending,
            },
            output_format,
        );
    }

    let report = register_missing(&client, &known).await?;

    if output_format.is_human() {
        print_report(&report, known.len());
    } else {
        print_output(&report, output_format)?;
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(SmctlError::ApiError {
            status: None,
            message: format!(
                "{} of the providers could not be registered",
                report.failed.len()
            ),
        })
    }
}

fn print_report(report: &RegistrationReport, known: usize) {
    if report.registered.is_empty()
        && report.already_registered.is_empty()
        && report.failed.is_empty()
    {
        println!("All {} known providers are registered.", known);
        return;
    }

    for resource_type in &report.registered {
        println!("  {} {}", "\u{2713}".green(), resource_type);
    }
    for resource_type in &report.already_registered {
        println!("  {} {} (already registered)", "-".dimmed(), resource_type);
    }
    for failure in &report.failed {
        println!(
            "  {} {}: {}",
            "\u{2717}".red(),
            failure.resource_type,
            failure.error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smctl_core::Config;

    fn manager_with_extras(extras: &[&str]) -> ConnectionManager {
        let config = Config {
            known_resource_types: extras.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        };
        ConnectionManager::with_config_path(config, None)
    }

    #[test]
    fn test_list_types_flag_replaces_catalog() {
        let mgr = manager_with_extras(&["Extra"]);
        let types = list_types(&mgr, &["Storage".to_string()]);
        assert_eq!(types, vec!["Storage"]);
    }

    #[test]
    fn test_list_types_defaults_to_catalog_with_extras() {
        let mgr = manager_with_extras(&["Extra"]);
        let types = list_types(&mgr, &[]);
        assert!(types.contains(&"Extra".to_string()));
        assert!(types.contains(&"Storage".to_string()));
    }

    #[test]
    fn test_sync_types_flag_extends_catalog() {
        let mgr = manager_with_extras(&[]);
        let types = sync_types(&mgr, &["Custom".to_string()]);
        assert!(types.contains(&"Custom".to_string()));
        assert!(types.contains(&"CloudServices".to_string()));
    }
}
