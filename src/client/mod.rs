//! HTTP client and the client facade

mod wechat_client;
pub use wechat_client::{WechatClient, WechatClientBuilder};

mod wechat_mp;
pub use wechat_mp::{Namespace, WechatMp};

mod builder;
pub use builder::WechatMpBuilder;
