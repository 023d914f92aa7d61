use std::error::Error;
use std::future::Future;
use std::time::Duration;

use crate::models::{PathRequest, PathResponse, SyncError};

/// Anything that can turn two endpoints into a path to draw.
///
/// Implementations never retry and never touch endpoint or map state; the
/// caller decides what to do with a failure.
pub trait PathClient: Send + Sync + 'static {
    fn request_path(
        &self,
        request: PathRequest,
    ) -> impl Future<Output = Result<PathResponse, SyncError>> + Send;
}

/// Path service client speaking the `?slat,slng,tlat,tlng` protocol over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPathClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPathClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SyncError::PathServiceUnavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn url_for(&self, request: &PathRequest) -> String {
        format!("{}?{}", self.base_url, request.to_query())
    }
}

impl PathClient for HttpPathClient {
    async fn request_path(&self, request: PathRequest) -> Result<PathResponse, SyncError> {
        let url = self.url_for(&request);
        tracing::debug!("Requesting path: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            // Log full error chain for debugging
            let mut error_msg = format!("Path service request failed: {}", e);
            let mut source = e.source();
            while let Some(err) = source {
                error_msg.push_str(&format!("\n  Caused by: {}", err));
                source = err.source();
            }
            tracing::warn!("{}", error_msg);
            SyncError::PathServiceUnavailable(error_msg)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Path service returned HTTP {}", status);
            return Err(SyncError::PathServiceUnavailable(format!(
                "path service returned {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            SyncError::PathServiceUnavailable(format!("Failed to read path service response: {}", e))
        })?;

        let decoded = PathResponse::decode(&body)?;
        tracing::debug!(
            "✅ Path service answered with {} points",
            decoded.path.points().len()
        );

        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn request() -> PathRequest {
        PathRequest::new(
            Coordinate::new(48.012653, 7.835194).unwrap(),
            Coordinate::new(48.010683, 7.81776).unwrap(),
        )
    }

    #[test]
    fn test_url_for() {
        let client =
            HttpPathClient::new("http://127.0.0.1:8888/", "route-sync-test", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.url_for(&request()),
            "http://127.0.0.1:8888/?48.012653,7.835194,48.010683,7.81776"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Port 9 (discard) is almost never listening locally
        let client =
            HttpPathClient::new("http://127.0.0.1:9/", "route-sync-test", Duration::from_secs(2))
                .unwrap();

        let result = client.request_path(request()).await;
        assert!(matches!(result, Err(SyncError::PathServiceUnavailable(_))));
    }
}
