use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use serde_json::json;
use tower::{Layer, Service, ServiceBuilder};
use wechat_mp_dispatch::middleware::LoggingMiddleware;
use wechat_mp_dispatch::types::{AppId, AppSecret};
use wechat_mp_dispatch::{MemoryTokenStore, Params, TokenRecord, WechatMp};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn short_credentials() -> (AppId, AppSecret) {
    (AppId::new("a1").unwrap(), AppSecret::new("s1").unwrap())
}

async fn token_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/cgi-bin/token")
        .count()
}

#[tokio::test]
async fn test_two_module_calls_share_one_token_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("grant_type", "client_credential"))
        .and(query_param("appid", "a1"))
        .and(query_param("secret", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "expires_in": 7200
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wxa/business/getuserphonenumber"))
        .and(query_param("access_token", "T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "phone_info": {"phoneNumber": "13800138000"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (appid, secret) = short_credentials();
    let wechat = WechatMp::builder()
        .appid(appid)
        .secret(secret)
        .base_url(server.uri())
        .build()
        .unwrap();

    let phone = wechat.module("phonenumber").unwrap();
    for code in ["c1", "c2"] {
        let payload = phone
            .call("getPhoneNumber", &json!({"code": code}), &Params::new())
            .await
            .unwrap();
        assert_eq!(
            payload.as_json().unwrap()["phone_info"]["phoneNumber"],
            "13800138000"
        );
    }

    assert_eq!(token_requests(&server).await, 1);
}

#[tokio::test]
async fn test_expired_stored_token_triggers_one_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T2",
            "expires_in": 7200
        })))
        .mount(&server)
        .await;

    let expired = TokenRecord::new("T1", SystemTime::now() - Duration::from_secs(60));
    let store = Arc::new(MemoryTokenStore::with_record(expired));

    let (appid, secret) = short_credentials();
    let wechat = WechatMp::builder()
        .appid(appid)
        .secret(secret)
        .base_url(server.uri())
        .token_store(store.clone())
        .build()
        .unwrap();

    assert_eq!(wechat.get_access_token().await.unwrap(), "T2");
    assert_eq!(wechat.get_access_token().await.unwrap(), "T2");
    assert_eq!(token_requests(&server).await, 1);
}

/// Layer that counts the requests routed through it.
#[derive(Clone, Default)]
struct CountingLayer {
    seen: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct CountingService<S> {
    inner: S,
    seen: Arc<AtomicUsize>,
}

impl<S> Layer<S> for CountingLayer {
    type Service = CountingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CountingService {
            inner,
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<S> Service<reqwest::Request> for CountingService<S>
where
    S: Service<reqwest::Request>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: reqwest::Request) -> Self::Future {
        self.seen.fetch_add(1, Ordering::SeqCst);
        self.inner.call(req)
    }
}

#[tokio::test]
async fn test_middleware_sees_token_and_module_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "expires_in": 7200
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wxa/msg_sec_check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0})))
        .mount(&server)
        .await;

    let counting = CountingLayer::default();
    let seen = Arc::clone(&counting.seen);
    let (appid, secret) = short_credentials();
    let wechat = WechatMp::builder()
        .appid(appid)
        .secret(secret)
        .base_url(server.uri())
        .with_middleware(
            ServiceBuilder::new()
                .layer(counting)
                .layer(LoggingMiddleware::new().verbose())
                .into_inner(),
        )
        .build()
        .unwrap();

    wechat
        .module("security")
        .unwrap()
        .call("msgSecCheck", &json!({"content": "hello"}), &Params::new())
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
