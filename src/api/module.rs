//! Dynamically built module namespaces
//!
//! A [`ModuleApi`] is materialized from a [`ModuleDefinition`] the first time
//! a caller asks the facade for that module. Each of its methods is a
//! [`ModuleMethod`] bound to the module name and endpoint, sending through
//! the shared [`RequestSender`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::api::r#trait::WechatContext;
use crate::api::registry::ModuleDefinition;
use crate::api::request::{ModuleRequest, Params, Payload, RequestSender};
use crate::error::WechatError;

/// A remote method bound to its module and endpoint.
#[derive(Debug, Clone)]
pub struct ModuleMethod {
    module: String,
    name: String,
    url: String,
    sender: RequestSender,
}

impl ModuleMethod {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends `data` as the JSON body with `params` added to the query string.
    pub async fn invoke<B: Serialize + ?Sized>(
        &self,
        data: &B,
        params: &Params,
    ) -> Result<Payload, WechatError> {
        self.sender
            .make_request(ModuleRequest {
                module: &self.module,
                url: &self.url,
                data,
                params,
            })
            .await
    }

    /// Invokes with an empty JSON object body and no extra params.
    pub async fn invoke_empty(&self) -> Result<Payload, WechatError> {
        self.invoke(&serde_json::json!({}), &Params::new()).await
    }
}

/// Namespace for one dispatched module.
pub struct ModuleApi {
    name: String,
    methods: BTreeMap<String, ModuleMethod>,
}

impl std::fmt::Debug for ModuleApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleApi")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ModuleApi {
    pub(crate) fn build(definition: &ModuleDefinition, context: Arc<WechatContext>) -> Self {
        let sender = RequestSender::new(context);
        let methods = definition
            .methods()
            .map(|(method, url)| {
                let bound = ModuleMethod {
                    module: definition.name().to_string(),
                    name: method.to_string(),
                    url: url.to_string(),
                    sender: sender.clone(),
                };
                (method.to_string(), bound)
            })
            .collect();

        Self {
            name: definition.name().to_string(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    /// `WechatError::UnknownMethod` if the module has no such method.
    pub fn method(&self, name: &str) -> Result<&ModuleMethod, WechatError> {
        self.methods
            .get(name)
            .ok_or_else(|| WechatError::UnknownMethod {
                module: self.name.clone(),
                method: name.to_string(),
            })
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Looks up `method` and invokes it.
    pub async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        data: &B,
        params: &Params,
    ) -> Result<Payload, WechatError> {
        self.method(method)?.invoke(data, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::WechatClient;
    use crate::token::TokenManager;
    use crate::types::{AppId, AppSecret};

    fn test_context() -> Arc<WechatContext> {
        let client = WechatClient::builder()
            .appid(AppId::new("wx1234567890abcdef").unwrap())
            .secret(AppSecret::new("secret1234567890ab").unwrap())
            .build()
            .unwrap();
        let token_manager = TokenManager::new(client.clone());
        Arc::new(WechatContext::new(
            Arc::new(client),
            Arc::new(token_manager),
        ))
    }

    #[test]
    fn test_build_binds_every_method() {
        let definition = ModuleDefinition::new("URLLink")
            .method("generate", "/wxa/generate_urllink")
            .method("query", "/wxa/query_urllink");

        let module = ModuleApi::build(&definition, test_context());

        assert_eq!(module.name(), "urllink");
        assert_eq!(module.method_names().collect::<Vec<_>>(), vec!["generate", "query"]);

        let generate = module.method("generate").unwrap();
        assert_eq!(generate.module(), "urllink");
        assert_eq!(generate.name(), "generate");
        assert_eq!(generate.url(), "/wxa/generate_urllink");
    }

    #[test]
    fn test_unknown_method() {
        let definition =
            ModuleDefinition::new("shortlink").method("generate", "/wxa/genwxashortlink");
        let module = ModuleApi::build(&definition, test_context());

        assert!(!module.has_method("query"));
        match module.method("query") {
            Err(WechatError::UnknownMethod { module, method }) => {
                assert_eq!(module, "shortlink");
                assert_eq!(method, "query");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
