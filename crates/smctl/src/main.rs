use anyhow::Result;
use clap::Parser;
use smctl_core::Config;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::SmctlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        match Config::load_from_path(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => exit_with(SmctlError::from(e)),
        }
    } else {
        debug!("Loading config from default location");
        match Config::load() {
            Ok(config) => (config, None),
            Err(e) => exit_with(SmctlError::from(e)),
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        exit_with(e);
    }

    Ok(())
}

fn exit_with(err: SmctlError) -> ! {
    err.print_diagnostic();
    std::process::exit(1);
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "smctl=warn,smctl_core=warn",
            1 => "smctl=info,smctl_core=info",
            2 => "smctl=debug,smctl_core=debug",
            _ => "smctl=trace,smctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), SmctlError> {
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            if cli.output.is_human() {
                println!("smctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            } else {
                output::print_output(
                    serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    }),
                    cli.output,
                )
            }
        }

        Commands::Provider(provider_cmd) => {
            commands::provider::handle_provider_command(provider_cmd, conn_mgr, profile, cli.output)
                .await
        }

        Commands::Operation(operation_cmd) => {
            commands::operation::handle_operation_command(
                operation_cmd,
                conn_mgr,
                profile,
                cli.output,
            )
            .await
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, cli.output).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Loggable form of the command, without secrets
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Provider(cmd) => format!("provider {:?}", cmd),
        Commands::Operation(cmd) => format!("operation {:?}", cmd),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands as P;
            match cmd {
                P::List => "profile list".to_string(),
                P::Path => "profile path".to_string(),
                P::Show { name } => format!("profile show {}", name),
                P::Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                P::Remove { name } => format!("profile remove {}", name),
                P::Default { name } => format!("profile default {}", name),
            }
        }
    }
}
