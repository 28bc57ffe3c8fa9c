//! Hosted dataset fetcher.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use vox_core::{Service, UpstreamError};
use vox_settings::UpstreamSettings;

use super::{build_client, check_status, join_url, map_transport, record};
use crate::errors::EngineError;
use crate::upstream::DatasetSource;

/// Fetches `GET {base}/{key}`.
pub struct HttpDatasetSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDatasetSource {
    /// Build from upstream settings.
    pub fn new(settings: &UpstreamSettings) -> Result<Self, EngineError> {
        let timeout = settings.dataset_timeout();
        Ok(Self {
            client: build_client(
                Service::Dataset,
                timeout,
                &settings.user_agent,
                reqwest::redirect::Policy::limited(settings.max_redirects),
            )?,
            base_url: settings.dataset_base_url.clone(),
            timeout,
        })
    }

    async fn get(&self, key: &str) -> Result<Bytes, UpstreamError> {
        let url = join_url(&self.base_url, key);
        debug!(%url, "fetching dataset");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_transport(Service::Dataset, self.timeout, &e))?;
        let response = check_status(Service::Dataset, response).await?;
        response
            .bytes()
            .await
            .map_err(|e| map_transport(Service::Dataset, self.timeout, &e))
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self, key: &str) -> Result<Bytes, UpstreamError> {
        let result = self.get(key).await;
        record(Service::Dataset, &result);
        result
    }
}
