use std::sync::Arc;

use h10cm_core::TrackerConfig;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::TokenSource;
use crate::cache::QueryCache;
use crate::envelope::{decode_list, decode_one};
use crate::error::{error_message, ApiError};

/// Typed client for the H10CM REST backend.
///
/// Endpoint methods live in [`crate::api`]; reads go through the query
/// cache and mutations invalidate what they changed.
pub struct H10Client {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
    cache: QueryCache,
}

impl H10Client {
    pub fn new(config: &TrackerConfig, token_source: Arc<dyn TokenSource>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.server.trim_end_matches('/').to_string(),
            token_source,
            cache: QueryCache::new(config.cache_capacity, config.cache_ttl),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    /// Send a request and return the raw JSON body (`Null` when empty).
    pub(crate) async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "request");
        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = self.authed(req).await?.send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("response body: {e}")))
    }

    pub(crate) async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        decode_list(self.request::<()>(Method::GET, path, None).await?)
    }

    pub(crate) async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode_one(self.request::<()>(Method::GET, path, None).await?)
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        decode_one(self.request(method, path, Some(body)).await?)
    }

    /// Send a mutation whose response body is not needed.
    pub(crate) async fn send_discard<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        self.request(method, path, body).await.map(|_| ())
    }
}
