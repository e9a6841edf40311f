//! HTTP transport for the Rapport service.

pub mod http;
pub mod ndjson;
pub mod wire;

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::error::{Operation, RapportError, Result};

use self::http::{api_headers, remaining_from_body, remaining_from_headers};

/// Endpoint paths relative to the base URL.
pub mod endpoints {
    pub const VERIFY: &str = "verify";
    pub const USAGE: &str = "usage";
    pub const MESSAGE: &str = "message";
    pub const ENGAGE: &str = "engage";
    pub const REWRITE: &str = "rewrite";
    pub const SORT: &str = "sort";
}

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Remaining-quota signal from the header or body, if present.
    pub remaining: Option<i64>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Decode a success body. A body of the wrong shape is a protocol error.
    pub fn decode<T: serde::de::DeserializeOwned>(&self, operation: Operation) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| RapportError::protocol(operation, format!("malformed response body: {e}")))
    }
}

/// Issues requests against the service with the credential attached.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Fails with [`RapportError::Configuration`] when the key cannot be sent
    /// as a header value.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if reqwest::header::HeaderValue::from_str(&api_key).is_err() {
            return Err(RapportError::Configuration(
                "API key contains characters not allowed in a header value".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| RapportError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body and read the whole response.
    ///
    /// `authenticated` attaches the credential header; verification sends the
    /// key in the body instead.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        path: &str,
        body: &B,
        authenticated: bool,
    ) -> Result<ApiResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let key = authenticated.then_some(self.api_key.as_str());
        debug!(%operation, path, %request_id, "POST");

        let resp = self
            .client
            .post(self.url(path))
            .headers(api_headers(key, &request_id))
            .json(body)
            .send()
            .await
            .map_err(|e| RapportError::network(operation, e))?;
        Self::read(operation, resp).await
    }

    /// GET an authenticated endpoint and read the whole response.
    pub async fn get_json(&self, operation: Operation, path: &str) -> Result<ApiResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(%operation, path, %request_id, "GET");

        let resp = self
            .client
            .get(self.url(path))
            .headers(api_headers(Some(&self.api_key), &request_id))
            .send()
            .await
            .map_err(|e| RapportError::network(operation, e))?;
        Self::read(operation, resp).await
    }

    /// POST an authenticated JSON body and hand back the unread response for streaming.
    pub async fn post_stream<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let request_id = uuid::Uuid::new_v4().to_string();
        debug!(%operation, path, %request_id, "POST (stream)");

        self.client
            .post(self.url(path))
            .headers(api_headers(Some(&self.api_key), &request_id))
            .json(body)
            .send()
            .await
            .map_err(|e| RapportError::network(operation, e))
    }

    async fn read(operation: Operation, resp: reqwest::Response) -> Result<ApiResponse> {
        let status = resp.status().as_u16();
        let header_remaining = remaining_from_headers(resp.headers());
        let body = resp
            .text()
            .await
            .map_err(|e| RapportError::network(operation, e))?;
        let remaining = header_remaining.or_else(|| remaining_from_body(&body));
        debug!(%operation, status, ?remaining, "response");
        Ok(ApiResponse {
            status,
            remaining,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_key_that_is_not_a_header_value() {
        let err = ApiClient::new("http://localhost", "rk-bad\nkey", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RapportError::Configuration(_)), "{err:?}");
    }

    #[test]
    fn accepts_plain_key_and_trims_base_url() {
        let client = ApiClient::new("http://localhost/", "rk-key", Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_key(), "rk-key");
        assert_eq!(client.url(endpoints::VERIFY), "http://localhost/verify");
    }
}
