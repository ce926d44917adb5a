use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use log::{debug, info};
use reqwest::{Request, Response, Url};
use tower::{Layer, Service};

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_FIELDS: &[&str] = &[
    "access_token",
    "appsecret",
    "secret",
    "session_key",
    "js_code",
    "password",
    "token",
    "authorization",
];

/// Logs every outgoing request and its response status.
///
/// Credentials in the query string are redacted before anything is logged.
/// `verbose` moves the lines from `info` to `debug` and adds the status
/// reason phrase.
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    verbose: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl<S> Layer<S> for LoggingMiddleware {
    type Service = LoggingMiddlewareService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddlewareService {
            inner,
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingMiddlewareService<S> {
    inner: S,
    verbose: bool,
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_FIELDS.iter().any(|s| key.eq_ignore_ascii_case(s))
}

pub(crate) fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if is_sensitive(&k) {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    // keep the marker readable instead of percent-encoded
    redacted.to_string().replace("%5BREDACTED%5D", REDACTED)
}

impl<S> Service<Request> for LoggingMiddlewareService<S>
where
    S: Service<Request, Response = Response> + Send + Clone + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        let url = redact_url(req.url());
        let verbose = self.verbose;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if verbose {
                debug!("[wechat-mp] >>> {} {}", method, url);
            } else {
                info!("[wechat-mp] {} {}", method, url);
            }

            let start = Instant::now();
            let response = inner.call(req).await?;
            let elapsed = start.elapsed();
            let status = response.status();

            if verbose {
                debug!(
                    "[wechat-mp] <<< {} {} ({:?})",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or(""),
                    elapsed
                );
            } else {
                info!("[wechat-mp] {} ({:?})", status.as_u16(), elapsed);
            }

            Ok(response)
        })
    }
}
