//! WeChat HTTP Client
//!
//! Thin wrapper over [`reqwest::Client`] that resolves paths against the API
//! host, routes every request through the optional middleware stack and
//! unwraps response bodies the same way for every call.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

use crate::error::{HttpError, WechatError};
use crate::types::{AppId, AppSecret};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.weixin.qq.com";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub(crate) type MiddlewareFuture =
    Pin<Box<dyn Future<Output = Result<reqwest::Response, reqwest::Error>> + Send>>;
pub(crate) type MiddlewareExecutor =
    Arc<dyn Fn(reqwest::Request) -> MiddlewareFuture + Send + Sync>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errcode: i32,
    #[serde(default)]
    errmsg: String,
}

/// WeChat API Client
///
/// Cheap to clone; clones share the connection pool and middleware.
#[derive(Clone)]
pub struct WechatClient {
    http: Client,
    appid: AppId,
    secret: AppSecret,
    base_url: String,
    middleware_executor: Option<MiddlewareExecutor>,
}

impl std::fmt::Debug for WechatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatClient")
            .field("appid", &self.appid)
            .field("base_url", &self.base_url)
            .field(
                "middleware_executor",
                &self.middleware_executor.as_ref().map(|_| ".."),
            )
            .finish_non_exhaustive()
    }
}

impl WechatClient {
    /// Create a new client builder
    pub fn builder() -> WechatClientBuilder {
        WechatClientBuilder::default()
    }

    /// Get the appid
    pub fn appid(&self) -> &str {
        self.appid.as_str()
    }

    pub(crate) fn secret(&self) -> &str {
        self.secret.as_str()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through untouched; anything else is joined onto the base URL.
    pub(crate) fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    pub(crate) fn with_middleware_executor(mut self, executor: MiddlewareExecutor) -> Self {
        self.middleware_executor = Some(executor);
        self
    }

    pub(crate) async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<Response, reqwest::Error> {
        if let Some(executor) = &self.middleware_executor {
            (executor)(request).await
        } else {
            self.http.execute(request).await
        }
    }

    /// Sends the request and unwraps a JSON payload.
    ///
    /// Non-2xx statuses and transport failures come back unchanged as
    /// `WechatError::Http`; a body carrying a non-zero `errcode` becomes
    /// `WechatError::Api`.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<T, WechatError> {
        let response = self.send_request(request).await?.error_for_status()?;

        let value: serde_json::Value = response.json().await?;

        if let Some(errcode) = value.get("errcode").and_then(|v| v.as_i64()) {
            let errmsg = value
                .get("errmsg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            WechatError::check_api(errcode.try_into().unwrap_or(i32::MAX), errmsg)?;
        }

        serde_json::from_value(value)
            .map_err(|e| WechatError::Http(HttpError::Decode(e.to_string())))
    }

    /// Make a GET request to WeChat API
    ///
    /// # Errors
    /// - `WechatError::Http` for transport failures, non-2xx statuses or decode failures
    /// - `WechatError::Api` when the body carries `errcode != 0`
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WechatError> {
        let request = self.http.get(self.resolve_url(path)).query(query).build()?;
        self.execute(request).await
    }

    /// Make a JSON POST request to WeChat API
    ///
    /// Same error contract as [`get`](Self::get).
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T, WechatError> {
        let request = self
            .http
            .post(self.resolve_url(path))
            .query(query)
            .json(body)
            .build()?;
        self.execute(request).await
    }

    /// POST a JSON body and return the raw response bytes.
    ///
    /// Used for endpoints that answer with images. WeChat reports failures on
    /// those endpoints as a JSON body, which is turned into `WechatError::Api`;
    /// a JSON body without a non-zero `errcode` is a `HttpError::Decode`.
    pub async fn post_bytes<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<Vec<u8>, WechatError> {
        let request = self
            .http
            .post(self.resolve_url(path))
            .query(query)
            .json(body)
            .build()?;
        let response = self.send_request(request).await?.error_for_status()?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        if is_json {
            let error: ErrorBody = response.json().await?;
            WechatError::check_api(error.errcode, &error.errmsg)?;
            return Err(WechatError::Http(HttpError::Decode(
                "expected binary body, got JSON without errcode".to_string(),
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

impl Service<reqwest::Request> for WechatClient {
    type Response = Response;
    type Error = reqwest::Error;
    type Future = MiddlewareFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        let client = self.http.clone();
        Box::pin(async move { client.execute(req).await })
    }
}

/// Builder for WechatClient
#[derive(Debug, Default)]
pub struct WechatClientBuilder {
    appid: Option<AppId>,
    secret: Option<AppSecret>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl WechatClientBuilder {
    pub fn appid(mut self, appid: AppId) -> Self {
        self.appid = Some(appid);
        self
    }

    pub fn secret(mut self, secret: AppSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Default: `<https://api.weixin.qq.com>`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Build the WechatClient
    ///
    /// # Errors
    /// Returns `WechatError::Config` if appid or secret is not set, or the
    /// base URL is not an http(s) URL.
    pub fn build(self) -> Result<WechatClient, WechatError> {
        let appid = self
            .appid
            .ok_or_else(|| WechatError::Config("appid is required".to_string()))?;
        let secret = self
            .secret
            .ok_or_else(|| WechatError::Config("secret is required".to_string()))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(WechatError::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                base_url
            )));
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let connect_timeout = self
            .connect_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| WechatError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(WechatClient {
            http,
            appid,
            secret,
            base_url,
            middleware_executor: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: Option<&str>) -> WechatClient {
        let mut builder = WechatClient::builder()
            .appid(AppId::new("wx1234567890abcdef").unwrap())
            .secret(AppSecret::new("secret1234567890ab").unwrap());
        if let Some(url) = base_url {
            builder = builder.base_url(url);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_builder_default_values() {
        let client = test_client(None);
        assert_eq!(client.appid(), "wx1234567890abcdef");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = test_client(Some("https://proxy.example.com/"));
        assert_eq!(client.base_url(), "https://proxy.example.com");
    }

    #[test]
    fn test_builder_rejects_non_http_base_url() {
        let result = WechatClient::builder()
            .appid(AppId::new("wx1234567890abcdef").unwrap())
            .secret(AppSecret::new("secret1234567890ab").unwrap())
            .base_url("ftp://api.weixin.qq.com")
            .build();
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_builder_missing_credentials() {
        let result = WechatClient::builder()
            .secret(AppSecret::new("secret1234567890ab").unwrap())
            .build();
        assert!(matches!(result, Err(WechatError::Config(_))));

        let result = WechatClient::builder()
            .appid(AppId::new("wx1234567890abcdef").unwrap())
            .build();
        assert!(matches!(result, Err(WechatError::Config(_))));
    }

    #[test]
    fn test_resolve_url() {
        let client = test_client(None);
        assert_eq!(
            client.resolve_url("/wxa/msg_sec_check"),
            "https://api.weixin.qq.com/wxa/msg_sec_check"
        );
        assert_eq!(
            client.resolve_url("https://other.example.com/wxa/getpaidunionid"),
            "https://other.example.com/wxa/getpaidunionid"
        );
    }
}
