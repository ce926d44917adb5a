//! WeChat Mini Program client with name-based API dispatch
//!
//! Takes care of the access token (fetch, cache, refresh before expiry,
//! optional external persistence) and turns module/method names into
//! token-authenticated calls, so new endpoints are a table entry rather than
//! new code.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use wechat_mp_dispatch::{Params, WechatMp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wechat = WechatMp::new("wx1234567890abcdef", "your_secret")?;
//!
//!     // Login with code from wx.login()
//!     let session = wechat.auth().login("code_from_miniprogram").await?;
//!     println!("OpenID: {}", session.openid);
//!
//!     // Any registered module, addressed by name
//!     let check = wechat
//!         .module("security")?
//!         .call("msgSecCheck", &json!({"content": "hello", "version": 2}), &Params::new())
//!         .await?;
//!     println!("{:?}", check.as_json());
//!
//!     // wxacode methods return image bytes
//!     let png = wechat
//!         .module("wxacode")?
//!         .call("getUnlimited", &json!({"scene": "a=1"}), &Params::new())
//!         .await?
//!         .into_bytes();
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - built-in namespaces, module registry and request dispatch
//! - [`client`] - HTTP client and the [`WechatMp`] facade
//! - [`crypto`] - Data decryption utilities
//! - [`error`] - Error types
//! - [`middleware`] - Tower middleware (request logging)
//! - [`token`] - Access token cache, external stores and refresh
//! - [`types`] - Credential and identifier newtypes
//!
//! ## Error Handling
//!
//! Every fallible call returns [`WechatError`]:
//!
//! ```rust,ignore
//! use wechat_mp_dispatch::WechatError;
//!
//! match wechat.module("analysis") {
//!     Ok(module) => { /* call it */ }
//!     Err(WechatError::UnknownModule(name)) => eprintln!("no module {}", name),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod api;
pub mod client;
pub mod crypto;
pub mod error;
pub mod middleware;
pub mod token;
pub mod types;

pub use api::{ModuleDefinition, ModuleRegistry, Params, Payload};
pub use client::{Namespace, WechatClient, WechatClientBuilder, WechatMp, WechatMpBuilder};
pub use error::WechatError;
pub use token::{MemoryTokenStore, TokenRecord, TokenStore};
