//! Access token management for WeChat API
//!
//! [`TokenManager`] hands out a valid access token, fetching a new one from
//! `/cgi-bin/token` whenever the cached record has expired.

mod cache;

use std::time::SystemTime;

use log::debug;
use serde::Deserialize;

use crate::client::WechatClient;
use crate::error::WechatError;
use crate::types::AccessToken;

pub use cache::{MemoryTokenStore, TokenCache, TokenRecord, TokenStore, EXPIRY_MARGIN_SECS};

pub(crate) const TOKEN_PATH: &str = "/cgi-bin/token";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Manages the access_token lifecycle
///
/// There is deliberately no lock around the expiry check and the refetch:
/// two tasks that both see an expired token will both fetch one, and the
/// later write wins.
#[derive(Debug)]
pub struct TokenManager {
    client: WechatClient,
    cache: TokenCache,
}

impl TokenManager {
    pub fn new(client: WechatClient) -> Self {
        Self::with_cache(client, TokenCache::in_memory())
    }

    pub fn with_cache(client: WechatClient, cache: TokenCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Returns a token that has not yet reached its (margin-adjusted) expiry.
    ///
    /// # Errors
    /// Transport, API and store failures propagate as-is; nothing is retried.
    pub async fn get_token(&self) -> Result<String, WechatError> {
        if let Some(record) = self.cache.current().await? {
            if record.is_valid() {
                debug!("using cached access token");
                return Ok(record.token);
            }
            debug!("access token expired, refreshing");
        } else {
            debug!("no access token cached, fetching");
        }

        let response = self.fetch_token().await?;
        let token = AccessToken::new(response.access_token).map_err(WechatError::Token)?;
        let record =
            TokenRecord::issued(token.into_string(), response.expires_in, SystemTime::now());

        debug!(
            "access token refreshed, server lifetime {}s",
            response.expires_in
        );

        self.cache.replace(record.clone()).await?;
        Ok(record.token)
    }

    async fn fetch_token(&self) -> Result<TokenResponse, WechatError> {
        let query = [
            ("grant_type", "client_credential"),
            ("appid", self.client.appid()),
            ("secret", self.client.secret()),
        ];

        self.client.get(TOKEN_PATH, &query).await
    }

    /// Forgets the current token so the next call fetches a new one, also
    /// when a store is attached. Use it after the API rejected the token.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
    }
}
