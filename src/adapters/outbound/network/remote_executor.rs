use super::http::HttpClient;
use crate::application::dto::ScanRequest;
use crate::ports::outbound::RemoteScanExecutor;
use crate::sbom_generation::domain::ScanResult;
use crate::shared::security::validate_endpoint;
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Default budget for one offloaded scan
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(300);

/// HttpRemoteExecutor ships a ScanRequest to a worker endpoint and reads
/// back the ScanResult the worker produced.
///
/// Any failure (timeout, transport, non-2xx status, undecodable body) is
/// returned to the caller, which then runs the scan locally.
pub struct HttpRemoteExecutor {
    http: HttpClient,
    endpoint: String,
}

impl HttpRemoteExecutor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;
        Ok(Self {
            http: HttpClient::new(timeout)?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteScanExecutor for HttpRemoteExecutor {
    async fn execute(&self, request: &ScanRequest) -> Result<ScanResult> {
        tracing::debug!(endpoint = %self.endpoint, target = %request.target.display_name(), "offloading scan");
        self.http.post_json(&self.endpoint, request).await
    }
}
