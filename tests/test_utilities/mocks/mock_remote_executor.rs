use async_trait::async_trait;
use dependency_canary::ports::outbound::RemoteScanExecutor;
use dependency_canary::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock RemoteScanExecutor that either answers with a canned result or fails
pub struct MockRemoteExecutor {
    response: Option<ScanResult>,
    calls: AtomicUsize,
}

impl MockRemoteExecutor {
    pub fn answering(result: ScanResult) -> Self {
        Self {
            response: Some(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteScanExecutor for MockRemoteExecutor {
    async fn execute(&self, request: &ScanRequest) -> Result<ScanResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Some(result) => Ok(result.clone()),
            None => anyhow::bail!(
                "remote worker timed out scanning {}",
                request.target.display_name()
            ),
        }
    }
}
