//! Built-in `auth` namespace
//!
//! Login session exchange, direct access to the token manager and paid
//! UnionID lookup. Unlike dispatched modules these are GET calls with
//! hand-picked query strings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::r#trait::WechatContext;
use crate::api::request::{as_pairs, with_params, Params};
use crate::error::WechatError;

pub(crate) const CODE2SESSION_PATH: &str = "/sns/jscode2session";
pub(crate) const PAID_UNIONID_PATH: &str = "/wxa/getpaidunionid";

/// Login response from code2Session API
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    /// User's unique ID under the Mini Program
    #[serde(default)]
    pub openid: String,
    /// Session key for decrypting user data
    #[serde(default)]
    pub session_key: String,
    /// User's unique ID across the WeChat open platform, when bound
    #[serde(default)]
    pub unionid: Option<String>,
    /// Every other field of the response body, kept as sent
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaidUnionIdResponse {
    #[serde(default)]
    pub unionid: String,
}

/// WeChat authentication API
#[derive(Debug)]
pub struct AuthApi {
    context: Arc<WechatContext>,
}

impl AuthApi {
    pub fn new(context: Arc<WechatContext>) -> Self {
        Self { context }
    }

    /// GET /sns/jscode2session
    ///
    /// Sends `appid`, `secret` and `grant_type=authorization_code` followed by
    /// `params`, which normally carries the `js_code` from `wx.login()`.
    pub async fn code2session(&self, params: &Params) -> Result<LoginResponse, WechatError> {
        let client = &self.context.client;
        let query = with_params(
            &[
                ("appid", client.appid()),
                ("secret", client.secret()),
                ("grant_type", "authorization_code"),
            ],
            params,
        );

        client.get(CODE2SESSION_PATH, &as_pairs(&query)).await
    }

    /// Shorthand for [`code2session`](Self::code2session) with just a `js_code`.
    pub async fn login(&self, js_code: &str) -> Result<LoginResponse, WechatError> {
        let mut params = Params::new();
        params.insert("js_code".to_string(), js_code.to_string());
        self.code2session(&params).await
    }

    pub async fn get_access_token(&self) -> Result<String, WechatError> {
        self.context.token_manager.get_token().await
    }

    /// GET /wxa/getpaidunionid
    ///
    /// `params` is either `openid` + `transaction_id`, or `openid` +
    /// `mch_id` + `out_trade_no`.
    pub async fn get_paid_union_id(
        &self,
        params: &Params,
    ) -> Result<PaidUnionIdResponse, WechatError> {
        let token = self.context.token_manager.get_token().await?;
        let query = with_params(&[("access_token", token.as_str())], params);

        self.context
            .client
            .get(PAID_UNIONID_PATH, &as_pairs(&query))
            .await
    }
}
