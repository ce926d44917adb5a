//! Tower middleware for the HTTP client
//!
//! Anything implementing `Layer<WechatClient>` can be installed with
//! [`WechatMpBuilder::with_middleware`](crate::WechatMpBuilder::with_middleware);
//! every request the client sends, token fetches included, passes through it.
//!
//! ```ignore
//! use wechat_mp_dispatch::middleware::LoggingMiddleware;
//!
//! let wechat = WechatMp::builder()
//!     .appid(appid)
//!     .secret(secret)
//!     .with_middleware(LoggingMiddleware::new().verbose())
//!     .build()?;
//! ```

pub use tower::{Layer, Service, ServiceBuilder};

mod logging;

pub use logging::{LoggingMiddleware, LoggingMiddlewareService};
