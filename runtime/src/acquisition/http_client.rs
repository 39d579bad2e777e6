//! Async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests. Handles redirects, timeouts and an
//! HTTP/1.1 fallback for CDNs that reject HTTP/2. There are no retries: a
//! failed request is a skipped candidate.

use crate::config::ScrapeConfig;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use std::time::Duration;

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client shared by the feed reader and the static engine.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback client for sites that reject HTTP/2.
    h1_client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with the configured user-agent and locale.
    pub fn new(config: &ScrapeConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(lang) = HeaderValue::from_str(&config.locale) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        let builder = || {
            reqwest::Client::builder()
                .timeout(Duration::from_millis(config.nav_timeout_ms))
                .redirect(reqwest::redirect::Policy::limited(5))
                .user_agent(config.user_agent.as_str())
                .default_headers(headers.clone())
        };

        let client = builder().build().unwrap_or_default();
        let h1_client = builder().http1_only().build().unwrap_or_default();

        Self { client, h1_client }
    }

    /// Perform a single GET request.
    ///
    /// Falls back to HTTP/1.1 on protocol errors (some CDNs reject HTTP/2).
    pub async fn get(&self, url: &str, timeout_ms: u64) -> Result<HttpResponse> {
        match self.get_inner(&self.client, url, timeout_ms).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                let err_str = format!("{e:#}");
                if err_str.contains("http2")
                    || err_str.contains("protocol")
                    || err_str.contains("connection closed")
                {
                    tracing::debug!("retrying {url} over HTTP/1.1: {err_str}");
                    self.get_inner(&self.h1_client, url, timeout_ms).await
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn get_inner(
        &self,
        client: &reqwest::Client,
        url: &str,
        timeout_ms: u64,
    ) -> Result<HttpResponse> {
        let r = client
            .get(url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let content_type = r
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = r
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_sends_locale_and_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/guide"))
            .and(header("accept-language", "fr-FR"))
            .respond_with(
                ResponseTemplate::new(404).set_body_raw("<p>introuvable</p>", "text/html"),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScrapeConfig::default());
        let resp = client
            .get(&format!("{}/pages/guide", server.uri()), 5_000)
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
        assert_eq!(resp.content_type.as_deref(), Some("text/html"));
        assert!(resp.body.contains("introuvable"));
    }

    #[tokio::test]
    async fn test_get_connection_refused_is_error() {
        let client = HttpClient::new(&ScrapeConfig::default());
        assert!(client.get("http://127.0.0.1:9/", 1_000).await.is_err());
    }
}
