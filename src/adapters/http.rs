use crate::domain::ports::Fetcher;
use crate::utils::error::{PcbLibError, Result};
use reqwest::Client;

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        tracing::debug!("Response status: {}", response.status());

        if !response.status().is_success() {
            return Err(PcbLibError::HttpStatusError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ipc7351_least.zip");
            then.status(200).body("zip-bytes");
        });

        let data = HttpFetcher::new()
            .fetch(&server.url("/ipc7351_least.zip"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(data, b"zip-bytes");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.zip");
            then.status(404);
        });

        let err = HttpFetcher::new()
            .fetch(&server.url("/missing.zip"))
            .await
            .unwrap_err();

        assert!(matches!(err, PcbLibError::HttpStatusError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        // bind then drop to get a port with nothing listening
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = HttpFetcher::new()
            .fetch(&format!("http://127.0.0.1:{}/ipc7351_most.zip", port))
            .await
            .unwrap_err();

        assert!(matches!(err, PcbLibError::NetworkError(_)));
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Network);
    }
}
