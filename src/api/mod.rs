//! API namespaces
//!
//! - [`auth`] - built-in login/session and token namespace
//! - [`crypto`] - built-in user-data decryption namespace
//! - [`registry`] - module definitions (method name → endpoint path)
//! - [`module`] - namespaces materialized from module definitions
//! - [`request`] - token-attaching request sender and call payloads

pub mod auth;
pub mod crypto;
pub mod module;
pub mod registry;
pub mod request;
pub mod r#trait;

pub use auth::{AuthApi, LoginResponse, PaidUnionIdResponse};
pub use crypto::CryptoApi;
pub use module::{ModuleApi, ModuleMethod};
pub use r#trait::WechatContext;
pub use registry::{ModuleDefinition, ModuleRegistry};
pub use request::{ModuleRequest, Params, Payload, RequestSender, BINARY_MODULE};
