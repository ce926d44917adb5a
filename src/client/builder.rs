use std::sync::Arc;
use std::time::Duration;

use reqwest::{Request as ReqwestRequest, Response as ReqwestResponse};
use tower::{Layer, Service};

use crate::api::{ModuleDefinition, ModuleRegistry, WechatContext};
use crate::error::WechatError;
use crate::token::{TokenCache, TokenManager, TokenStore};
use crate::types::{AppId, AppSecret};

use super::wechat_client::{MiddlewareExecutor, MiddlewareFuture, WechatClient};
use super::WechatMp;

/// Builder for [`WechatMp`]
///
/// Only `appid` and `secret` are required. Without a token store the token
/// lives in memory and is shared by clones of the built client only.
#[must_use]
pub struct WechatMpBuilder<M = ()> {
    appid: Option<AppId>,
    secret: Option<AppSecret>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    token_store: Option<Arc<dyn TokenStore>>,
    registry: ModuleRegistry,
    middleware: Option<M>,
}

impl Default for WechatMpBuilder<()> {
    fn default() -> Self {
        Self {
            appid: None,
            secret: None,
            base_url: None,
            timeout: None,
            connect_timeout: None,
            token_store: None,
            registry: ModuleRegistry::builtin(),
            middleware: None,
        }
    }
}

impl<M> std::fmt::Debug for WechatMpBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatMpBuilder")
            .field("appid", &self.appid)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("token_store", &self.token_store.as_ref().map(|_| ".."))
            .field("modules", &self.registry.len())
            .field("middleware", &self.middleware.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

impl<M> WechatMpBuilder<M> {
    pub fn appid(mut self, appid: AppId) -> Self {
        self.appid = Some(appid);
        self
    }

    pub fn secret(mut self, secret: AppSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Persist the access token externally instead of in process memory.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Adds a module on top of the built-in ones, replacing any with the same name.
    pub fn register_module(mut self, definition: ModuleDefinition) -> Self {
        self.registry.register(definition);
        self
    }

    /// Replaces the whole module registry, built-ins included.
    pub fn modules(mut self, registry: ModuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_middleware<M2>(self, middleware: M2) -> WechatMpBuilder<M2>
    where
        M2: Layer<WechatClient> + Clone + Send + Sync + 'static,
    {
        WechatMpBuilder {
            appid: self.appid,
            secret: self.secret,
            base_url: self.base_url,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            token_store: self.token_store,
            registry: self.registry,
            middleware: Some(middleware),
        }
    }

    /// # Errors
    /// `WechatError::Config` for missing credentials or an invalid base URL.
    pub fn build(self) -> Result<WechatMp, WechatError>
    where
        M: Layer<WechatClient> + Clone + Send + Sync + 'static,
        M::Service: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
            + Clone
            + Send
            + Sync
            + 'static,
        <M::Service as Service<ReqwestRequest>>::Future: Send + 'static,
    {
        let appid = self
            .appid
            .ok_or_else(|| WechatError::Config("appid is required".to_string()))?;
        let secret = self
            .secret
            .ok_or_else(|| WechatError::Config("secret is required".to_string()))?;

        let mut client = WechatClient::builder().appid(appid).secret(secret);
        if let Some(url) = self.base_url {
            client = client.base_url(url);
        }
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            client = client.connect_timeout(timeout);
        }
        let mut client = client.build()?;

        if let Some(middleware) = self.middleware {
            let service = middleware.layer(client.clone());
            client = client.with_middleware_executor(make_middleware_executor(service));
        }

        let cache = match self.token_store {
            Some(store) => TokenCache::with_store(store),
            None => TokenCache::in_memory(),
        };
        let token_manager = Arc::new(TokenManager::with_cache(client.clone(), cache));
        let context = Arc::new(WechatContext::new(Arc::new(client), token_manager));

        Ok(WechatMp::from_parts(context, self.registry))
    }
}

fn make_middleware_executor<S>(service: S) -> MiddlewareExecutor
where
    S: Service<ReqwestRequest, Response = ReqwestResponse, Error = reqwest::Error>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    let service = Arc::new(service);

    Arc::new(move |request: ReqwestRequest| -> MiddlewareFuture {
        let mut service = (*service).clone();
        Box::pin(async move { service.call(request).await })
    })
}

