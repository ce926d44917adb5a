//! Shared context for namespaces that call the WeChat API

use std::sync::Arc;

use crate::client::WechatClient;
use crate::token::TokenManager;

/// Resources every token-authenticated namespace needs.
#[derive(Clone)]
pub struct WechatContext {
    pub(crate) client: Arc<WechatClient>,
    pub(crate) token_manager: Arc<TokenManager>,
}

impl std::fmt::Debug for WechatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatContext")
            .field("client", &self.client)
            .field("token_manager", &"TokenManager { .. }")
            .finish()
    }
}

impl WechatContext {
    pub fn new(client: Arc<WechatClient>, token_manager: Arc<TokenManager>) -> Self {
        Self {
            client,
            token_manager,
        }
    }

    pub fn client(&self) -> &WechatClient {
        &self.client
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }
}
