//! The client facade
//!
//! [`WechatMp`] owns the built-in `crypto` and `auth` namespaces and resolves
//! every other name against the module registry, building and caching a
//! [`ModuleApi`] the first time a module is asked for.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::api::{AuthApi, CryptoApi, ModuleApi, ModuleRegistry, WechatContext};
use crate::error::WechatError;
use crate::types::{AppId, AppSecret};

/// Result of resolving a namespace name on the facade.
#[derive(Debug, Clone)]
pub enum Namespace {
    Crypto(Arc<CryptoApi>),
    Auth(Arc<AuthApi>),
    Module(Arc<ModuleApi>),
}

impl Namespace {
    pub fn name(&self) -> &str {
        match self {
            Namespace::Crypto(_) => "crypto",
            Namespace::Auth(_) => "auth",
            Namespace::Module(module) => module.name(),
        }
    }

    pub fn into_module(self) -> Option<Arc<ModuleApi>> {
        match self {
            Namespace::Module(module) => Some(module),
            _ => None,
        }
    }
}

/// Unified WeChat Mini Program client
///
/// ```rust,ignore
/// use serde_json::json;
/// use wechat_mp_dispatch::{Params, WechatMp};
///
/// let wechat = WechatMp::new("wx1234567890abcdef", "your_secret")?;
///
/// let result = wechat
///     .module("security")?
///     .call("msgSecCheck", &json!({"content": "hello"}), &Params::new())
///     .await?;
/// ```
///
/// Clones share the token state and the module cache.
#[derive(Clone)]
pub struct WechatMp {
    context: Arc<WechatContext>,
    crypto: Arc<CryptoApi>,
    auth: Arc<AuthApi>,
    registry: Arc<ModuleRegistry>,
    modules: Arc<RwLock<HashMap<String, Arc<ModuleApi>>>>,
}

impl std::fmt::Debug for WechatMp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatMp")
            .field("context", &self.context)
            .field("registry", &self.registry.names())
            .finish_non_exhaustive()
    }
}

impl WechatMp {
    pub fn builder() -> super::builder::WechatMpBuilder {
        super::builder::WechatMpBuilder::default()
    }

    /// Client with default settings and the built-in modules.
    ///
    /// # Errors
    /// `WechatError::Config` if `appid` or `secret` is empty.
    pub fn new(appid: &str, secret: &str) -> Result<Self, WechatError> {
        Self::builder()
            .appid(AppId::new(appid).map_err(WechatError::Config)?)
            .secret(AppSecret::new(secret).map_err(WechatError::Config)?)
            .build()
    }

    pub(crate) fn from_parts(context: Arc<WechatContext>, registry: ModuleRegistry) -> Self {
        let appid = context.client().appid().to_string();
        Self {
            crypto: Arc::new(CryptoApi::new(appid)),
            auth: Arc::new(AuthApi::new(Arc::clone(&context))),
            context,
            registry: Arc::new(registry),
            modules: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn appid(&self) -> &str {
        self.context.client().appid()
    }

    pub fn context(&self) -> &WechatContext {
        &self.context
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn crypto(&self) -> Arc<CryptoApi> {
        Arc::clone(&self.crypto)
    }

    pub fn auth(&self) -> Arc<AuthApi> {
        Arc::clone(&self.auth)
    }

    pub async fn get_access_token(&self) -> Result<String, WechatError> {
        self.context.token_manager.get_token().await
    }

    pub async fn invalidate_token(&self) {
        self.context.token_manager.invalidate().await;
    }

    /// Resolves any namespace by (case-insensitive) name.
    ///
    /// Built-in namespaces shadow registry modules of the same name.
    ///
    /// # Errors
    /// `WechatError::UnknownModule` when the name is neither built in nor
    /// registered.
    pub fn namespace(&self, name: &str) -> Result<Namespace, WechatError> {
        match name.to_lowercase().as_str() {
            "crypto" => Ok(Namespace::Crypto(self.crypto())),
            "auth" => Ok(Namespace::Auth(self.auth())),
            module => self.module(module).map(Namespace::Module),
        }
    }

    /// Resolves a registry module, building it on first access.
    ///
    /// Repeated calls return the same `Arc`. A failed lookup leaves the cache
    /// untouched.
    ///
    /// # Errors
    /// `WechatError::UnknownModule` when no module has that name.
    pub fn module(&self, name: &str) -> Result<Arc<ModuleApi>, WechatError> {
        let name = name.to_lowercase();

        if let Some(module) = self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
        {
            return Ok(Arc::clone(module));
        }

        let definition = self
            .registry
            .get(&name)
            .ok_or_else(|| WechatError::UnknownModule(name.clone()))?;

        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        let module = modules.entry(name).or_insert_with(|| {
            debug!(
                "materializing module `{}` ({} methods)",
                definition.name(),
                definition.len()
            );
            Arc::new(ModuleApi::build(definition, Arc::clone(&self.context)))
        });

        Ok(Arc::clone(module))
    }

    /// Names of the modules materialized so far.
    pub fn loaded_modules(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> WechatMp {
        WechatMp::new("wx1234567890abcdef", "secret1234567890ab").unwrap()
    }

    #[test]
    fn test_new_rejects_empty_credentials() {
        assert!(matches!(
            WechatMp::new("", "secret"),
            Err(WechatError::Config(_))
        ));
        assert!(matches!(
            WechatMp::new("wx1234567890abcdef", ""),
            Err(WechatError::Config(_))
        ));
    }

    #[test]
    fn test_builtin_namespaces() {
        let wechat = test_client();
        assert_eq!(wechat.namespace("crypto").unwrap().name(), "crypto");
        assert_eq!(wechat.namespace("AUTH").unwrap().name(), "auth");
        assert!(wechat.loaded_modules().is_empty());
    }

    #[test]
    fn test_module_is_cached() {
        let wechat = test_client();
        let first = wechat.module("wxacode").unwrap();
        let second = wechat.module("WxaCode").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(wechat.loaded_modules(), vec!["wxacode".to_string()]);
    }

    #[test]
    fn test_clones_share_module_cache() {
        let wechat = test_client();
        let clone = wechat.clone();
        let first = wechat.module("security").unwrap();
        let second = clone.namespace("security").unwrap().into_module().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_module_leaves_cache_empty() {
        let wechat = test_client();
        match wechat.namespace("doesnotexist") {
            Err(WechatError::UnknownModule(name)) => assert_eq!(name, "doesnotexist"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(wechat.loaded_modules().is_empty());
    }

    #[test]
    fn test_crypto_bound_to_appid() {
        let wechat = test_client();
        assert_eq!(wechat.crypto().appid(), "wx1234567890abcdef");
    }
}
