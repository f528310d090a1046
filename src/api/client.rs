//! HTTP client for the odorok backend
//!
//! `ApiClient` owns the reqwest client, the credential source and the response
//! cache shared by every endpoint wrapper. Reference data that is the same for
//! every user goes through [`ApiClient::get_cached`]; per-user reads that are
//! safe to reuse go through [`ApiClient::get_cached_private`], whose keys carry
//! a fingerprint of the bearer credential. Everything else hits the network
//! each time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::{redirect, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::auth::{TokenStore, TokenStoreError};
use crate::cache::{CacheKey, CacheKeyBuilder, SingleFlightCache, SweeperHandle};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::retry::recover_once;

/// Query parameters of a request, in the order they are sent
pub type Query = Vec<(&'static str, String)>;

/// Key parameter holding the credential fingerprint; `@` never appears in a
/// backend query name
const CREDENTIAL_PARAM: &str = "@credential";

/// Fingerprint used for requests sent without a token
const ANONYMOUS: &str = "anonymous";

/// Which callers may share a cached response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// The response is the same for every caller
    Shared,
    /// The response depends on the bearer credential
    PerCredential,
}

/// Short SHA-256 fingerprint of the current bearer token
///
/// Keeps the token itself out of cache keys and log lines.
fn credential_fingerprint(tokens: &dyn TokenStore) -> String {
    match tokens.bearer() {
        Some(token) => format!("{:x}", Sha256::digest(token.as_bytes())).chars().take(16).collect(),
        None => ANONYMOUS.to_string(),
    }
}

/// Cloneable part of the client that performs requests
///
/// Cached suppliers must own everything they touch, so they carry a clone of
/// this rather than a borrow of the client.
#[derive(Debug, Clone)]
struct Transport {
    http: Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenStore>,
    requests_sent: Arc<AtomicU64>,
}

impl Transport {
    /// Sends one request and decodes a 2xx JSON body
    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, query: &Query, body: Option<&Value>) -> Result<T, ApiError> {
        let url = self.config.url(path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query);
        if let Some(token) = self.tokens.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        debug!(method = %method, url = %url, "sending request");

        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(method = %method, url = %url, status = status.as_u16(), "request failed");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        // Some write endpoints answer 2xx with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    /// Sends a request; on 401 reloads the stored credential and retries once
    async fn send_authorized<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        recover_once(
            || self.send(method.clone(), path, query, body),
            ApiError::is_unauthorized,
            || async {
                match self.tokens.reload() {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(TokenStoreError::Unchanged),
                    Err(e) => Err(e),
                }
            },
        )
        .await
    }
}

/// Client for the odorok REST API
#[derive(Debug)]
pub struct ApiClient {
    transport: Transport,
    cache: SingleFlightCache<Value, ApiError>,
    _sweeper: Option<SweeperHandle>,
}

impl ApiClient {
    /// Creates a client with its own response cache
    ///
    /// If `config.sweep_interval` is set, a background sweeper is spawned, which
    /// requires a running tokio runtime.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let cache: SingleFlightCache<Value, ApiError> = SingleFlightCache::new();
        let sweeper = config
            .sweep_interval
            .and_then(|interval| cache.spawn_sweeper(interval));

        Ok(Self {
            transport: Transport {
                http,
                config,
                tokens,
                requests_sent: Arc::new(AtomicU64::new(0)),
            },
            cache,
            _sweeper: sweeper,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.transport.config
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.transport.tokens
    }

    /// The response cache shared by every cached endpoint
    pub fn cache(&self) -> &SingleFlightCache<Value, ApiError> {
        &self.cache
    }

    /// Number of HTTP requests sent so far (retries included)
    pub fn requests_sent(&self) -> u64 {
        self.transport.requests_sent.load(Ordering::Relaxed)
    }

    /// Builds the cache key for a GET of `path` with `query`
    ///
    /// This is the [`CacheScope::Shared`] key; see [`ApiClient::scoped_cache_key`].
    pub fn cache_key(path: &str, query: &Query) -> CacheKey {
        Self::key_builder(path, query).build()
    }

    /// Builds the cache key for a GET of `path` with `query` in `scope`
    ///
    /// Per-credential keys include a fingerprint of the token currently in the
    /// store, so switching users never serves the previous user's response.
    pub fn scoped_cache_key(&self, scope: CacheScope, path: &str, query: &Query) -> CacheKey {
        let builder = Self::key_builder(path, query);
        match scope {
            CacheScope::Shared => builder.build(),
            CacheScope::PerCredential => builder
                .param(CREDENTIAL_PARAM, credential_fingerprint(self.transport.tokens.as_ref()))
                .build(),
        }
    }

    fn key_builder(path: &str, query: &Query) -> CacheKeyBuilder {
        query
            .iter()
            .fold(CacheKey::builder(path), |key, (name, value)| key.param(name, value))
    }

    /// Performs an uncached GET
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<T, ApiError> {
        self.transport.send_authorized(Method::GET, path, &query, None).await
    }

    /// Performs a GET through the response cache, shared by every user
    ///
    /// Concurrent calls with the same path and query share one request, and a
    /// successful response is reused for the configured TTL.
    pub async fn get_cached(&self, path: &str, query: Query) -> Result<Value, ApiError> {
        self.get_scoped(CacheScope::Shared, path, query).await
    }

    /// Performs a GET through the response cache, separately per credential
    pub async fn get_cached_private(&self, path: &str, query: Query) -> Result<Value, ApiError> {
        self.get_scoped(CacheScope::PerCredential, path, query).await
    }

    async fn get_scoped(&self, scope: CacheScope, path: &str, query: Query) -> Result<Value, ApiError> {
        let key = self.scoped_cache_key(scope, path, &query);
        let transport = self.transport.clone();
        let path = path.to_string();

        self.cache
            .get_or_fetch(&key, self.transport.config.cache_ttl, move || async move {
                transport.send_authorized(Method::GET, &path, &query, None).await
            })
            .await
    }

    /// Performs a POST with a JSON body
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.transport
            .send_authorized(Method::POST, path, &Query::new(), Some(&body))
            .await
    }

    /// Performs a POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.transport
            .send_authorized(Method::POST, path, &Query::new(), None)
            .await
    }

    /// Drops the shared cached response for a GET of `path` with `query`
    pub fn invalidate(&self, path: &str, query: &Query) -> bool {
        self.invalidate_scoped(CacheScope::Shared, path, query)
    }

    /// Drops the current credential's cached response for a GET of `path` with `query`
    pub fn invalidate_private(&self, path: &str, query: &Query) -> bool {
        self.invalidate_scoped(CacheScope::PerCredential, path, query)
    }

    fn invalidate_scoped(&self, scope: CacheScope, path: &str, query: &Query) -> bool {
        let key = self.scoped_cache_key(scope, path, query);
        debug!(key = %key, "invalidating cached response");
        self.cache.invalidate(&key)
    }

    /// Drops every cached response and forgets in-flight requests
    pub fn clear_cache(&self) {
        debug!("clearing response cache");
        self.cache.clear();
    }
}
