//! Document retrieval for the lookup pipeline.

use std::time::Duration;

use disclosure_common::{LookupError, Result};
use disclosure_config::FetchConfig;
use disclosure_http::{HttpClient, HttpError, RequestOpts};
use url::Url;

/// Raw document bytes plus where they came from. Owned by one extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// URL the document was requested from.
    pub url: Url,
    /// Served `Content-Type`; its charset decides how `bytes` are decoded.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Retrieve `url`, within a bounded time, or fail with [`LookupError::Fetch`].
    async fn fetch(&self, url: &Url) -> Result<SourceDocument>;
}

/// Fetcher backed by [`HttpClient`]: spoofed client identity, timeout,
/// retries on transient failures and a body size cap.
#[derive(Clone)]
pub struct HttpFetcher {
    http: HttpClient,
}

impl HttpFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(cfg: &FetchConfig) -> std::result::Result<Self, HttpError> {
        let http = HttpClient::new(&cfg.user_agent)?
            .with_timeout(Duration::from_secs(cfg.timeout_secs))
            .with_retries(cfg.retries)
            .with_max_body_bytes(cfg.max_body_bytes);
        Ok(Self::new(http))
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<SourceDocument> {
        let body = self
            .http
            .get_bytes(url.as_str(), RequestOpts::default())
            .await
            .map_err(|e| LookupError::Fetch(e.to_string()))?;

        if body.url != *url {
            tracing::debug!(requested = %url, landed = %body.url, "fetch.redirected");
        }

        Ok(SourceDocument {
            url: url.clone(),
            content_type: body.content_type,
            bytes: body.bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(retries: usize) -> HttpFetcher {
        HttpFetcher::from_config(&FetchConfig {
            retries,
            timeout_secs: 5,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn presents_the_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/candidate.php"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(&b"<p>hi</p>"[..], "text/html; charset=iso-8859-1"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/candidate.php", server.uri())).unwrap();
        let doc = fetcher(0).fetch(&url).await.unwrap();
        assert_eq!(doc.bytes, b"<p>hi</p>");
        assert_eq!(doc.url, url);
        assert_eq!(doc.content_type.as_deref(), Some("text/html; charset=iso-8859-1"));
    }

    #[tokio::test]
    async fn http_failures_become_fetch_errors_with_the_cause() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden by WAF"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/candidate.php", server.uri())).unwrap();
        let err = fetcher(0).fetch(&url).await.unwrap_err();
        assert_eq!(err.kind(), "fetch_error");
        assert!(err.to_string().contains("403"));
    }
}
