//! Request sending for dispatched module calls

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::r#trait::WechatContext;
use crate::error::{HttpError, WechatError};

/// Extra query-string parameters for a call.
pub type Params = BTreeMap<String, String>;

/// Module whose endpoints answer with image bytes instead of JSON.
pub const BINARY_MODULE: &str = "wxacode";

/// Unwrapped response body of a module call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            Payload::Json(_) => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            Payload::Json(_) => None,
        }
    }

    /// Decodes a JSON payload into a typed response.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, WechatError> {
        match self {
            Payload::Json(value) => serde_json::from_value(value)
                .map_err(|e| WechatError::Http(HttpError::Decode(e.to_string()))),
            Payload::Binary(_) => Err(WechatError::Http(HttpError::Decode(
                "binary payload cannot be decoded as JSON".to_string(),
            ))),
        }
    }
}

/// A single dispatched call.
#[derive(Debug)]
pub struct ModuleRequest<'a, B: ?Sized> {
    pub module: &'a str,
    pub url: &'a str,
    pub data: &'a B,
    pub params: &'a Params,
}

/// Query string `{access_token, ...params}`; caller params win on a clash.
pub(crate) fn with_params(base: &[(&str, &str)], params: &Params) -> Params {
    let mut query: Params = base
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    query.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    query
}

pub(crate) fn as_pairs(query: &Params) -> Vec<(&str, &str)> {
    query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Attaches a fresh access token to module calls and sends them.
#[derive(Debug, Clone)]
pub struct RequestSender {
    context: Arc<WechatContext>,
}

impl RequestSender {
    pub fn new(context: Arc<WechatContext>) -> Self {
        Self { context }
    }

    /// POSTs `data` as JSON with the token and `params` in the query string.
    ///
    /// # Errors
    /// Token, transport and API errors are returned unchanged.
    pub async fn make_request<B: Serialize + ?Sized>(
        &self,
        request: ModuleRequest<'_, B>,
    ) -> Result<Payload, WechatError> {
        let token = self.context.token_manager.get_token().await?;
        let query = with_params(&[("access_token", token.as_str())], request.params);
        let query = as_pairs(&query);

        debug!("[{}] POST {}", request.module, request.url);

        let client = &self.context.client;
        if request.module == BINARY_MODULE {
            client
                .post_bytes(request.url, &query, request.data)
                .await
                .map(Payload::Binary)
        } else {
            client
                .post(request.url, &query, request.data)
                .await
                .map(Payload::Json)
        }
    }
}
