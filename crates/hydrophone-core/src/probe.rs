//! HTTP reachability probe for media URLs.
//!
//! Validation issues a real GET for every URL entry, so document writes depend
//! on the object store being reachable at request time.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::defaults::PROBE_TIMEOUT;
use crate::error::{Error, Result};
use crate::traits::UrlProbe;

/// `UrlProbe` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpUrlProbe {
    client: Client,
}

impl HttpUrlProbe {
    /// Build the probe client. Each request is bounded by [`PROBE_TIMEOUT`].
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("URL probe client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn probe(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| {
            debug!(
                subsystem = "validation",
                component = "url_probe",
                url,
                error = %e,
                "URL parse failed"
            );
            Error::UnreachableUri
        })?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            debug!(
                subsystem = "validation",
                component = "url_probe",
                url,
                error = %e,
                "URL request failed"
            );
            Error::UnreachableUri
        })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            debug!(
                subsystem = "validation",
                component = "url_probe",
                url,
                status = status.as_u16(),
                "URL answered with error status"
            );
            return Err(Error::UnreachableUri);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_reachability_accepts_success_and_redirect_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp3"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/not-modified.png"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let probe = HttpUrlProbe::new().unwrap();
        assert!(probe.probe(&format!("{}/clip.mp3", server.uri())).await.is_ok());
        assert!(probe
            .probe(&format!("{}/not-modified.png", server.uri()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reachability_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpUrlProbe::new().unwrap();
        let result = probe.probe(&format!("{}/missing.png", server.uri())).await;
        assert!(matches!(result, Err(Error::UnreachableUri)));
    }

    #[tokio::test]
    async fn test_reachability_collapses_parse_errors() {
        let probe = HttpUrlProbe::new().unwrap();
        assert!(matches!(
            probe.probe("not a url").await,
            Err(Error::UnreachableUri)
        ));
    }

    #[tokio::test]
    async fn test_reachability_collapses_transport_errors() {
        let probe = HttpUrlProbe::new().unwrap();
        // Port 9 (discard) on loopback is not expected to accept HTTP.
        assert!(matches!(
            probe.probe("http://127.0.0.1:9/a.png").await,
            Err(Error::UnreachableUri)
        ));
    }
}
