//! API client for the tournament REST server.
//!
//! Collections live at `{base}/{collection}` and single records at
//! `{base}/{collection}/{id}`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::models::{Collection, Records};

use super::ApiError;

/// API client for the tournament server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<Arc<String>>,
}

impl ApiClient {
    /// Create a new API client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a new ApiClient with the given bearer token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<Arc<String>>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn collection_url(&self, collection: Collection) -> Url {
        self.url(&[collection.path()])
    }

    pub fn record_url(&self, collection: Collection, id: &str) -> Url {
        self.url(&[collection.path(), id])
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token.as_str()),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    // ===== Reads =====

    /// Fetch and parse a whole collection. Single attempt.
    pub async fn fetch(&self, collection: Collection) -> Result<Records, ApiError> {
        let url = self.collection_url(collection);
        debug!(%url, "GET collection");

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = Self::check_response(response).await?;
        let body = response.bytes().await?;

        Records::from_slice(collection, &body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse {} response: {}", collection, e))
        })
    }

    // ===== Writes =====

    /// POST a new record to `collection`.
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.collection_url(collection);
        debug!(%url, "POST record");

        let response = self.authorized(self.client.post(url)).json(body).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// PATCH an existing record.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        id: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.record_url(collection, id);
        debug!(%url, "PATCH record");

        let response = self.authorized(self.client.patch(url)).json(body).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// DELETE a record.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), ApiError> {
        let url = self.record_url(collection, id);
        debug!(%url, "DELETE record");

        let response = self.authorized(self.client.delete(url)).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }
}
