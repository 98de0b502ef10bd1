//! Transport abstraction over the HTTP wire.
//!
//! The rest of the crate talks to [`Transport`] only, so tests can substitute
//! a scripted transport and production uses [`ReqwestTransport`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::Error;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    headers: HashMap<String, String>,
    pub body: Bytes,
    /// The URL the response actually came from, after redirects.
    pub final_url: Url,
}

impl TransportResponse {
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Bytes,
        final_url: Url,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            status,
            headers,
            body,
            final_url,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The wire operations the filesystem needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Metadata-only probe. Must not fetch the body.
    async fn head(&self, url: &Url) -> Result<TransportResponse, Error>;

    /// Body fetch with optional extra request headers (e.g. `Range`).
    async fn get(&self, url: &Url, headers: &[(String, String)])
        -> Result<TransportResponse, Error>;
}

/// Production transport backed by a shared [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30))
    }

    async fn convert(response: reqwest::Response) -> Result<TransportResponse, Error> {
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;
        Ok(TransportResponse::new(status, headers, body, final_url))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn head(&self, url: &Url) -> Result<TransportResponse, Error> {
        let response = self.client.head(url.clone()).send().await?;
        Self::convert(response).await
    }

    async fn get(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<TransportResponse, Error> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().await?;
        Self::convert(response).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/html".to_string());
        let response = TransportResponse::new(
            200,
            headers,
            Bytes::new(),
            Url::parse("https://example.com/").unwrap(),
        );
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn success_is_any_2xx() {
        let ok = mock::response("https://example.com/", 204, &[], "");
        assert!(ok.is_success());
        let redirect = mock::response("https://example.com/", 301, &[], "");
        assert!(!redirect.is_success());
        let missing = mock::response("https://example.com/", 404, &[], "");
        assert!(!missing.is_success());
    }
}
