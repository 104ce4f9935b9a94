//! Subscription-scoped Service Management client
//!
//! Holds everything a request needs (transport, subscription id, correlation
//! id) so no call depends on process-wide state.

use crate::error::Result;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};
use std::sync::Arc;
use tracing::trace;

/// Value sent in the `x-ms-version` header
pub const API_VERSION: &str = "2013-03-01";

/// Default public-cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.core.windows.net";

pub const HEADER_API_VERSION: &str = "x-ms-version";
pub const HEADER_SESSION_ID: &str = "x-ms-client-session-id";
pub const HEADER_REQUEST_ID: &str = "x-ms-client-request-id";

/// Client bound to one subscription
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ServiceManagementClient {
    transport: Arc<dyn Transport>,
    subscription_id: String,
    correlation_id: String,
}

impl std::fmt::Debug for ServiceManagementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManagementClient")
            .field("subscription_id", &self.subscription_id)
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}

impl ServiceManagementClient {
    /// Create a client for `subscription_id`
    ///
    /// `correlation_id` is sent with every request so a whole session can be
    /// traced on the service side.
    pub fn new(
        transport: Arc<dyn Transport>,
        subscription_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            subscription_id: subscription_id.into(),
            correlation_id: correlation_id.into(),
        }
    }

    /// Create a client with a freshly generated correlation id
    pub fn with_new_session(
        transport: Arc<dyn Transport>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self::new(transport, subscription_id, uuid::Uuid::new_v4().to_string())
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Send a request with the standard Service Management headers attached
    pub(crate) async fn send(
        &self,
        method: HttpMethod,
        path_and_query: String,
    ) -> Result<HttpResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        trace!("Request {} for session {}", request_id, self.correlation_id);

        let request = HttpRequest::new(method, path_and_query)
            .header(HEADER_API_VERSION, API_VERSION)
            .header("Accept", "application/xml")
            .header(HEADER_SESSION_ID, self.correlation_id.as_str())
            .header(HEADER_REQUEST_ID, request_id);

        self.transport.send(request).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport shared by the unit tests

    use super::*;
    use crate::error::CoreError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request it saw
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse>>>,
        pub requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<Result<HttpResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CoreError::Connection("script exhausted".to_string())))
        }
    }
}
