use std::time::Duration;

use crate::config::EnrichConfig;
use crate::error::Result;
use crate::http::RateLimitedClient;
use crate::identifiers::Doi;

const BASE_URL: &str = "https://doi.org";

/// Existence probe against the DOI resolver. Used as the cheapest possible
/// fallback when the metadata registry is unreachable: a resolving DOI is at
/// least real, even if nothing is known about the work behind it.
pub struct DoiOrgResolver {
    client: RateLimitedClient,
    base_url: String,
    timeout: Duration,
}

impl DoiOrgResolver {
    pub fn new() -> Self {
        Self::with_params(BASE_URL, Duration::from_secs(3))
    }

    pub fn from_config(config: &EnrichConfig) -> Self {
        Self::with_params(BASE_URL, config.doi_probe_timeout())
    }

    pub fn with_params(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: RateLimitedClient::new(Duration::from_millis(100), 0, timeout, "citemend/0.1"),
            base_url: base_url.to_string(),
            timeout,
        }
    }

    /// HEAD request for the DOI. Redirects count as alive: the resolver
    /// answers registered DOIs with a redirect to the publisher.
    pub async fn probe(&self, doi: &Doi) -> Result<bool> {
        let url = format!("{}/{}", self.base_url, doi.normalized);
        let status = self.client.head(&url, self.timeout).await?;
        Ok(status.is_success() || status.is_redirection())
    }
}

impl Default for DoiOrgResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn probe_accepts_success() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("HEAD", "/10.1000/xyz123")
            .with_status(200)
            .create_async()
            .await;

        let resolver = DoiOrgResolver::with_params(&server.url(), Duration::from_secs(2));
        let doi = Doi::parse("10.1000/xyz123").unwrap();
        assert!(resolver.probe(&doi).await.unwrap());
    }

    #[tokio::test]
    async fn probe_fails_on_server_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("HEAD", "/10.1000/xyz123")
            .with_status(500)
            .create_async()
            .await;

        let resolver = DoiOrgResolver::with_params(&server.url(), Duration::from_secs(2));
        let doi = Doi::parse("10.1000/xyz123").unwrap();
        assert!(!resolver.probe(&doi).await.unwrap());
    }
}
