//! Long-running operation tracking
//!
//! An asynchronous management call returns a tracking id. [`wait_for`] polls
//! the status of that id on a fixed interval until it is terminal or the
//! attempt budget runs out:
//!
//! ```text
//! Pending -> Polling -+-> Succeeded
//!              ^  |   +-> Failed
//!              +--+   +-> TimedOut (error)
//!          InProgress, sleep
//! ```
//!
//! Attempts are inclusive: a budget of `n` means at most `n` polls with
//! `n - 1` sleeps between them, and no sleep after the last poll.

use crate::client::ServiceManagementClient;
use crate::error::{CoreError, Result};
use crate::progress::{ProgressCallback, ProgressEvent, emit};
use crate::transport::HttpMethod;
use crate::xml;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Server-side state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::InProgress)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationState::InProgress => write!(f, "InProgress"),
            OperationState::Succeeded => write!(f, "Succeeded"),
            OperationState::Failed => write!(f, "Failed"),
        }
    }
}

impl std::str::FromStr for OperationState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "InProgress" => Ok(OperationState::InProgress),
            "Succeeded" => Ok(OperationState::Succeeded),
            "Failed" => Ok(OperationState::Failed),
            other => Err(CoreError::MalformedResponse(format!(
                "unknown operation status '{}'",
                other
            ))),
        }
    }
}

/// Error payload attached to a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    pub code: String,
    pub message: String,
}

/// Snapshot of an operation's status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub tracking_id: String,
    pub status: OperationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl OperationStatus {
    pub fn new(tracking_id: impl Into<String>, status: OperationState) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            status,
            http_status_code: None,
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(OperationError {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Parse an `<Operation>` status document
///
/// `requested_id` fills in the id when the document leaves `ID` empty.
pub fn parse_operation_status(body: &str, requested_id: &str) -> Result<OperationStatus> {
    let root = xml::parse_root(body, "Operation")?;

    let id = root.child_text("ID");
    let status = root.child_text("Status").parse()?;
    let http_status_code = root.child_text("HttpStatusCode").parse().ok();
    let error = root.child("Error").map(|e| OperationError {
        code: e.child_text("Code"),
        message: e.child_text("Message"),
    });

    Ok(OperationStatus {
        tracking_id: if id.is_empty() {
            requested_id.to_string()
        } else {
            id
        },
        status,
        http_status_code,
        error,
    })
}

/// Anything that can report the current status of a tracking id
#[async_trait]
pub trait OperationStatusSource: Send + Sync {
    async fn fetch_status(&self, tracking_id: &str) -> Result<OperationStatus>;
}

/// `/{subscription}/operations/{tracking_id}`
pub fn operation_path(subscription_id: &str, tracking_id: &str) -> String {
    format!(
        "/{}/operations/{}",
        urlencoding::encode(subscription_id),
        urlencoding::encode(tracking_id)
    )
}

#[async_trait]
impl OperationStatusSource for ServiceManagementClient {
    async fn fetch_status(&self, tracking_id: &str) -> Result<OperationStatus> {
        let path = operation_path(self.subscription_id(), tracking_id);
        let response = self.send(HttpMethod::Get, path).await?.ensure_success()?;
        parse_operation_status(&response.body, tracking_id)
    }
}

/// How often and how many times to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    /// One poll a minute for half an hour
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(CoreError::Validation(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Validation(
                "Max attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Longest time a wait can sleep in total
    pub fn ceiling(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

/// Poll `tracking_id` until it is terminal
///
/// Returns the terminal status, `Failed` included; inspect
/// [`OperationStatus::status`] to tell the two apart. Errors from individual
/// polls are returned as-is without retrying. Dropping the future stops the
/// wait.
///
/// # Example
///
/// ```rust,ignore
/// use smctl_core::{PollPolicy, wait_for};
///
/// let status = wait_for(&client, &tracking_id, PollPolicy::default(), None).await?;
/// println!("{} finished: {}", tracking_id, status.status);
/// ```
pub async fn wait_for<S>(
    source: &S,
    tracking_id: &str,
    policy: PollPolicy,
    on_progress: Option<ProgressCallback>,
) -> Result<OperationStatus>
where
    S: OperationStatusSource + ?Sized,
{
    policy.validate()?;
    if tracking_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "Tracking id must not be empty".to_string(),
        ));
    }

    let start = Instant::now();
    emit(
        &on_progress,
        ProgressEvent::Started {
            tracking_id: tracking_id.to_string(),
        },
    );

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let status = source.fetch_status(tracking_id).await?;
        debug!(
            "Operation {} poll {}/{}: {}",
            tracking_id, attempt, policy.max_attempts, status.status
        );

        emit(
            &on_progress,
            ProgressEvent::Polling {
                tracking_id: tracking_id.to_string(),
                attempt,
                status: status.status,
                elapsed: start.elapsed(),
            },
        );

        match status.status {
            OperationState::Succeeded => {
                info!("Operation {} succeeded after {} polls", tracking_id, attempt);
                emit(
                    &on_progress,
                    ProgressEvent::Completed {
                        tracking_id: tracking_id.to_string(),
                    },
                );
                return Ok(status);
            }
            OperationState::Failed => {
                let error = status
                    .error
                    .as_ref()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "Operation failed".to_string());
                warn!("Operation {} failed: {}", tracking_id, error);
                emit(
                    &on_progress,
                    ProgressEvent::Failed {
                        tracking_id: tracking_id.to_string(),
                        error,
                    },
                );
                return Ok(status);
            }
            OperationState::InProgress if attempt >= policy.max_attempts => {
                warn!(
                    "Operation {} still in progress after {} polls, giving up",
                    tracking_id, attempt
                );
                emit(
                    &on_progress,
                    ProgressEvent::TimedOut {
                        tracking_id: tracking_id.to_string(),
                        attempts: attempt,
                    },
                );
                return Err(CoreError::OperationTimeout {
                    tracking_id: tracking_id.to_string(),
                    attempts: attempt,
                    last_status: Box::new(status),
                });
            }
            OperationState::InProgress => {
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}

/// [`wait_for`] that also stops as soon as `cancel` completes
///
/// `cancel` can be a shutdown signal, a `tokio::time::sleep` deadline or a
/// channel receive; when it wins the race the result is
/// [`CoreError::Cancelled`].
pub async fn wait_for_until<S, F>(
    source: &S,
    tracking_id: &str,
    policy: PollPolicy,
    on_progress: Option<ProgressCallback>,
    cancel: F,
) -> Result<OperationStatus>
where
    S: OperationStatusSource + ?Sized,
    F: Future<Output = ()>,
{
    tokio::select! {
        result = wait_for(source, tracking_id, policy, on_progress) => result,
        _ = cancel => {
            info!("Wait for operation {} cancelled", tracking_id);
            Err(CoreError::Cancelled(tracking_id.to_string()))
        }
    }
}
