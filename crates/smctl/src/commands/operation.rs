//! Long-running operation commands
//!
//! `wait` wraps the core waiter with a spinner and stops cleanly on Ctrl-C.

use std::time::Duration;

use colored::Colorize;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use smctl_core::config::PollingConfig;
use smctl_core::{
    OperationState, OperationStatus, OperationStatusSource, ProgressCallback, ProgressEvent,
    wait_for_until,
};
use tracing::{debug, warn};

use crate::cli::{OperationCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::{Result, SmctlError};
use crate::output::print_output;

pub async fn handle_operation_command(
    command: &OperationCommands,
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    output_format: OutputFormat,
) -> Result<()> {
    match command {
        OperationCommands::Show { tracking_id } => {
            let client = conn_mgr.create_client(profile)?;
            let status = client.fetch_status(tracking_id).await?;
            print_status(&status, output_format)
        }
        OperationCommands::Wait {
            tracking_id,
            interval,
            max_attempts,
        } => {
            let polling = merge_polling(
                conn_mgr.polling_config(profile)?,
                *interval,
                *max_attempts,
            );
            handle_wait(conn_mgr, profile, tracking_id, polling, output_format).await
        }
    }
}

/// Command-line flags override the profile's polling settings
fn merge_polling(
    base: PollingConfig,
    interval: Option<u64>,
    max_attempts: Option<u32>,
) -> PollingConfig {
    PollingConfig {
        interval_secs: interval.unwrap_or(base.interval_secs),
        max_attempts: max_attempts.unwrap_or(base.max_attempts),
    }
}

async fn handle_wait(
    conn_mgr: &ConnectionManager,
    profile: Option<&str>,
    tracking_id: &str,
    polling: PollingConfig,
    output_format: OutputFormat,
) -> Result<()> {
    let client = conn_mgr.create_client(profile)?;
    let policy = polling.to_policy();
    debug!(
        "Waiting on {} every {}s, up to {} attempts",
        tracking_id, polling.interval_secs, polling.max_attempts
    );

    // Spinner only for humans; machine formats stay clean on stdout/stderr
    let spinner = output_format.is_human().then(|| new_spinner(tracking_id));
    let callback = spinner.clone().map(spinner_callback);

    let cancel = cancel_on(tokio::signal::ctrl_c());
    let result = wait_for_until(&client, tracking_id, policy, callback, cancel).await;

    let status = match result {
        Ok(status) => status,
        Err(e) => {
            if let Some(pb) = &spinner {
                pb.finish_and_clear();
            }
            return Err(SmctlError::from(e));
        }
    };

    print_status(&status, output_format)?;

    if status.status == OperationState::Failed {
        let message = status
            .error
            .as_ref()
            .map(|e| format!("{}: {}", e.code, e.message))
            .unwrap_or_else(|| "no error details returned".to_string());
        return Err(SmctlError::OperationFailed {
            tracking_id: status.tracking_id,
            message,
        });
    }
    Ok(())
}

/// Resolves when `signal` fires
///
/// If the signal handler cannot be installed this never resolves, so the
/// wait ends only through the waiter itself.
async fn cancel_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Cannot listen for Ctrl-C, wait is not cancellable: {}", e);
        std::future::pending::<()>().await;
    }
}

fn new_spinner(tracking_id: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Waiting for operation {}", tracking_id));
    pb
}

fn spinner_callback(pb: ProgressBar) -> ProgressCallback {
    Box::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Started { tracking_id } => {
            pb.set_message(format!("Operation {} started", tracking_id));
        }
        ProgressEvent::Polling {
            tracking_id,
            attempt,
            status,
            ..
        } => {
            pb.set_message(format!(
                "Operation {}: {} (attempt {})",
                tracking_id,
                format_state(*status),
                attempt
            ));
        }
        ProgressEvent::Completed { tracking_id } => {
            pb.finish_with_message(format!(
                "Operation {}: {}",
                tracking_id,
                format_state(OperationState::Succeeded)
            ));
        }
        ProgressEvent::Failed { tracking_id, error } => {
            pb.finish_with_message(format!("Operation {} failed: {}", tracking_id, error));
        }
        ProgressEvent::TimedOut {
            tracking_id,
            attempts,
        } => {
            pb.finish_with_message(format!(
                "Operation {} still running after {} attempts",
                tracking_id, attempts
            ));
        }
    })
}

/// Format operation state for display with status icons
fn format_state(state: OperationState) -> String {
    match state {
        OperationState::Succeeded => format!("\u{2713} {}", state), // checkmark
        OperationState::Failed => format!("\u{2717} {}", state),    // x mark
        OperationState::InProgress => format!("\u{21bb} {}", state), // arrow circle
    }
}

fn print_status(status: &OperationStatus, output_format: OutputFormat) -> Result<()> {
    if !output_format.is_human() {
        return print_output(status, output_format);
    }

    let state = match status.status {
        OperationState::Succeeded => format_state(status.status).green().to_string(),
        OperationState::Failed => format_state(status.status).red().to_string(),
        OperationState::InProgress => format_state(status.status).yellow().to_string(),
    };
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Tracking ID".to_string(), status.tracking_id.clone()]);
    table.add_row(vec!["Status".to_string(), state]);
    if let Some(code) = status.http_status_code {
        table.add_row(vec!["HTTP Status".to_string(), code.to_string()]);
    }
    if let Some(error) = &status.error {
        table.add_row(vec!["Error Code".to_string(), error.code.clone()]);
        table.add_row(vec!["Error Message".to_string(), error.message.clone()]);
    }
    println!("{}", table);
    Ok(())
}
