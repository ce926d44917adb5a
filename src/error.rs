//! Error types for the dispatch client

use std::sync::Arc;

use thiserror::Error;

/// Transport-level failures
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Reqwest(Arc<reqwest::Error>),

    #[error("response decode failed: {0}")]
    Decode(String),
}

/// WeChat SDK error types
#[derive(Debug, Error)]
pub enum WechatError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WeChat API error (code={code}): {message}")]
    Api { code: i32, message: String },

    #[error("Access token error: {0}")]
    Token(String),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No such module: {0}")]
    UnknownModule(String),

    #[error("No such method `{method}` in module `{module}`")]
    UnknownMethod { module: String, method: String },

    #[error("Decryption error: {0}")]
    Crypto(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),
}

impl From<reqwest::Error> for WechatError {
    fn from(e: reqwest::Error) -> Self {
        WechatError::Http(HttpError::Reqwest(Arc::new(e)))
    }
}

impl WechatError {
    /// Turns a WeChat `errcode`/`errmsg` pair into a result.
    pub(crate) fn check_api(errcode: i32, errmsg: &str) -> Result<(), WechatError> {
        if errcode != 0 {
            return Err(WechatError::Api {
                code: errcode,
                message: errmsg.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the API rejected the access token itself (invalid or expired).
    pub fn is_token_error(&self) -> bool {
        matches!(self, WechatError::Api { code, .. } if matches!(code, 40001 | 40014 | 42001))
    }
}
