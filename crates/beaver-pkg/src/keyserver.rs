//! Signing key download over HTTP

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::error::PackageError;
use crate::traits::KeyFetcher;

/// Fetches keys with a plain unauthenticated GET
#[derive(Debug, Clone, Default)]
pub struct HttpKeyFetcher {
    client: reqwest::Client,
}

impl HttpKeyFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PackageError> {
        let key_error = |e: reqwest::Error| PackageError::KeyFetch {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(key_error)?;
        let body = response.bytes().await.map_err(key_error)?;

        info!(bytes = body.len(), "fetched signing key");
        Ok(body.to_vec())
    }
}
