//! Router Forwarding Client
//!
//! Sends an accepted request to the router's `/query` endpoint and hands
//! back the raw status and body for verbatim relay. The wait is bounded at
//! 30 seconds; a timeout does not cancel whatever the router is still
//! doing downstream.

use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use sqlrelay_common::{QueryRequest, RelayError, Result};

/// Bound on the forward-and-wait to the router.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the router's internal endpoint.
#[derive(Clone)]
pub struct RouterClient {
    /// Base URL of the router, e.g. `http://10.0.0.9:5000`.
    base_url: String,
    timeout: Duration,
}

impl RouterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            timeout: FORWARD_TIMEOUT,
        }
    }

    /// Overrides the forward timeout; the default is [`FORWARD_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Forwards a request and returns the router's raw status and body.
    ///
    /// Transport failures and timeouts become errors here; HTTP error
    /// statuses from the router are not errors, they are relayed.
    pub async fn forward(&self, request: &QueryRequest) -> Result<(StatusCode, Bytes)> {
        let url = format!("{}/query", self.base_url);
        let body = serde_json::to_vec(request)?;

        let http_request = Request::builder()
            .method("POST")
            .uri(&url)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RelayError::Transport(format!("Failed to build request: {}", e)))?;

        let client = Client::builder(TokioExecutor::new()).build_http();

        // The bound covers the whole exchange, body read included: a
        // router that returns headers and then stalls mid-body must not
        // hang the gate request.
        let exchange = async {
            let response = client
                .request(http_request)
                .await
                .map_err(|e| RelayError::Transport(format!("HTTP request failed: {}", e)))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| RelayError::Transport(format!("Failed to read response: {}", e)))?
                .to_bytes();
            Ok::<_, RelayError>((status, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| RelayError::Timeout(self.timeout.as_millis() as u64))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RouterClient::new("http://127.0.0.1:5000/");
        assert_eq!(client.base_url, "http://127.0.0.1:5000");
    }

    #[tokio::test]
    async fn test_forward_timeout_covers_stalled_body_read() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // a server that answers with headers and a partial body, then
        // holds the connection open without ever finishing the body
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 1000\r\n\r\n{",
                )
                .await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let client =
            RouterClient::new(format!("http://{}", addr)).with_timeout(Duration::from_millis(200));
        let request = QueryRequest {
            query: "SELECT 1".to_string(),
            strategy: "direct_hit".to_string(),
        };

        let started = std::time::Instant::now();
        let err = client.forward(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_forward_unreachable_router_is_transport_error() {
        // bind then drop so the port is known-closed
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RouterClient::new(format!("http://{}", addr));
        let request = QueryRequest {
            query: "SELECT 1".to_string(),
            strategy: "direct_hit".to_string(),
        };
        let err = client.forward(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
    }
}
