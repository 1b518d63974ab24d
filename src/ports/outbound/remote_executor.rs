use crate::application::dto::ScanRequest;
use crate::sbom_generation::domain::ScanResult;
use crate::shared::Result;
use async_trait::async_trait;

/// RemoteScanExecutor port for running the pipeline on another machine
///
/// The remote side receives the same request and must answer with the same
/// result shape as a local run.
#[async_trait]
pub trait RemoteScanExecutor: Send + Sync {
    /// # Errors
    /// Any error makes the caller fall back to local execution.
    async fn execute(&self, request: &ScanRequest) -> Result<ScanResult>;
}
