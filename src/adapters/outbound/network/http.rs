use crate::shared::security::validate_url_component;
use crate::shared::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Default per-request timeout for registry and feed calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_ATTEMPTS: u32 = 3;

/// Outcome of a single request attempt.
enum Attempt {
    /// Transport failure or 5xx; worth another try
    Retry(anyhow::Error),
    /// 4xx, decode failure; retrying cannot help
    Fail(anyhow::Error),
}

/// Shared JSON-over-HTTPS client with the crate user agent, a per-request
/// timeout and linear-backoff retries.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_attempts: u32,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            max_attempts: MAX_ATTEMPTS,
        })
    }

    /// GETs `url` and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.with_retry(|| async move {
            let response = self.client.get(url).send().await;
            Self::decode(url, response).await
        })
        .await
    }

    /// POSTs `body` as JSON to `url` and decodes the JSON answer.
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.with_retry(|| async move {
            let response = self.client.post(url).json(body).send().await;
            Self::decode(url, response).await
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, mut attempt_once: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, Attempt>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_once().await {
                Ok(value) => return Ok(value),
                Err(Attempt::Fail(e)) => return Err(e),
                Err(Attempt::Retry(e)) if attempt >= self.max_attempts => return Err(e),
                Err(Attempt::Retry(e)) => {
                    tracing::debug!(attempt, error = %e, "request failed; retrying");
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Result<reqwest::Response>,
    ) -> std::result::Result<T, Attempt> {
        let response = response.map_err(|e| Attempt::Retry(anyhow::anyhow!("{}: {}", url, e)))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(Attempt::Retry(anyhow::anyhow!("{} returned status {}", url, status)));
        }
        if !status.is_success() {
            return Err(Attempt::Fail(anyhow::anyhow!("{} returned status {}", url, status)));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| Attempt::Fail(anyhow::anyhow!("cannot decode {}: {}", url, e)))
    }
}

/// Validates and percent-encodes a registry package name for use as a URL
/// path. npm scopes stay readable: `@types/node` -> `@types/node`.
pub fn package_path(name: &str) -> Result<String> {
    if let Some((scope, bare)) = name.strip_prefix('@').and_then(|n| n.split_once('/')) {
        validate_url_component(scope, "Package scope")?;
        validate_url_component(bare, "Package name")?;
        return Ok(format!(
            "@{}/{}",
            urlencoding::encode(scope),
            urlencoding::encode(bare)
        ));
    }
    validate_url_component(name, "Package name")?;
    Ok(urlencoding::encode(name).into_owned())
}

/// Validates and percent-encodes one version path segment.
pub fn version_path(version: &str) -> Result<String> {
    validate_url_component(version, "Version")?;
    Ok(urlencoding::encode(version).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        assert!(HttpClient::new(DEFAULT_TIMEOUT).is_ok());
    }

    #[test]
    fn test_package_path() {
        assert_eq!(package_path("requests").unwrap(), "requests");
        assert_eq!(package_path("@types/node").unwrap(), "@types/node");
        assert_eq!(package_path("zope.interface").unwrap(), "zope.interface");
        assert!(package_path("../etc/passwd").is_err());
        assert!(package_path("a/b").is_err());
        assert!(package_path("@scope/../x").is_err());
    }

    #[test]
    fn test_version_path() {
        assert_eq!(version_path("1.0.0+build").unwrap(), "1.0.0%2Bbuild");
        assert!(version_path("1.0?x").is_err());
    }
}
